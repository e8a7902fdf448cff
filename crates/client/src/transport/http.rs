//! HTTP transport layer for the Qortal client.

use crate::config::ClientConfig;
use crate::error::{QortalError, QortalResult};
use reqwest::{Client, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

/// Header carrying the node API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// HTTP transport for read-only Qortal Core requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> QortalResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("qortal-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QortalError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Build a URL on `base` from percent-encoded path segments.
    fn build_url(base: &Url, segments: &[&str]) -> QortalResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| QortalError::Config(format!("{base} cannot be used as a base URL")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Execute a GET request and decode the JSON body.
    ///
    /// The primary node is tried first. Only when it is unreachable, and
    /// public fallback is enabled, are the public nodes tried in order. The
    /// API key is never sent to a public node.
    pub async fn get(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        use_api_key: bool,
    ) -> QortalResult<Value> {
        for (index, node) in self.config.nodes().enumerate() {
            let url = Self::build_url(node, segments)?;
            debug!(url = %url, fallback = index > 0, "GET request");

            let mut request = self.client.get(url).query(query);
            if index == 0 && use_api_key {
                if let Some(ref api_key) = self.config.api_key {
                    request = request.header(API_KEY_HEADER, api_key);
                }
            }

            match request.send().await {
                Ok(response) => return Self::decode(response).await,
                Err(e) if e.is_builder() => {
                    return Err(QortalError::Config(format!("invalid request: {e}")));
                }
                Err(e) => {
                    warn!(
                        node = %node,
                        timeout = e.is_timeout(),
                        "Qortal node unreachable"
                    );
                }
            }
        }

        Err(QortalError::Unreachable)
    }

    async fn decode(response: Response) -> QortalResult<Value> {
        let status = response.status().as_u16();
        if status == 401 {
            return Err(QortalError::Unauthorized { status });
        }

        let body = response
            .text()
            .await
            .map_err(|_| QortalError::UnexpectedResponse { status })?;

        let data: Value = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(_) => {
                error!(status, "Unexpected non-JSON response from node");
                return Err(QortalError::UnexpectedResponse { status });
            }
        };

        if status >= 400 {
            let code = data.get("error").and_then(Value::as_str);
            return Err(QortalError::from_status(status, code));
        }

        Ok(data)
    }
}
