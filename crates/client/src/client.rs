//! Main client for the Qortal Core API.

use crate::api::*;
use crate::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::{QortalError, QortalResult};
use crate::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Client for the whitelisted, read-only part of the Qortal Core API.
#[derive(Debug, Clone)]
pub struct QortalClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl QortalClient {
    /// Create a new client builder.
    pub fn builder() -> QortalClientBuilder {
        QortalClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> QortalResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    /// Configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the node administration API.
    pub fn node(&self) -> NodeApi<'_> {
        NodeApi::new(self)
    }

    /// Get the addresses API.
    pub fn addresses(&self) -> AddressesApi<'_> {
        AddressesApi::new(self)
    }

    /// Get the names API.
    pub fn names(&self) -> NamesApi<'_> {
        NamesApi::new(self)
    }

    /// Get the cross-chain trades API.
    pub fn trades(&self) -> TradesApi<'_> {
        TradesApi::new(self)
    }

    /// Get the arbitrary (QDN) API.
    pub fn arbitrary(&self) -> ArbitraryApi<'_> {
        ArbitraryApi::new(self)
    }
}

/// Builder for creating a QortalClient.
pub struct QortalClientBuilder {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    public_nodes: Vec<String>,
    allow_public_fallback: bool,
}

impl QortalClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            public_nodes: Vec::new(),
            allow_public_fallback: false,
        }
    }

    /// Set the base URL of the primary node.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API key used for admin endpoints on the primary node.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a public fallback node.
    pub fn public_node(mut self, url: impl Into<String>) -> Self {
        self.public_nodes.push(url.into());
        self
    }

    /// Allow requests to fall back to public nodes.
    pub fn allow_public_fallback(mut self, allow: bool) -> Self {
        self.allow_public_fallback = allow;
        self
    }

    /// Build the client.
    pub fn build(self) -> QortalResult<QortalClient> {
        if self.timeout.is_zero() {
            return Err(QortalError::Config("timeout must be positive".to_string()));
        }

        let base_url = Url::parse(&self.base_url)?;
        let public_nodes = self
            .public_nodes
            .iter()
            .map(|node| Url::parse(node))
            .collect::<Result<Vec<_>, _>>()?;

        let config = ClientConfig {
            base_url,
            api_key: self.api_key,
            timeout: self.timeout,
            public_nodes,
            allow_public_fallback: self.allow_public_fallback,
        };

        QortalClient::from_config(config)
    }
}

impl Default for QortalClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
