//! Configuration types for the Qortal client.

use std::time::Duration;
use url::Url;

/// Default Qortal Core API endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:12391";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Qortal client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Primary node. The only node that ever receives the API key.
    pub base_url: Url,
    /// API key sent as `X-API-KEY` on admin endpoints.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Public nodes tried, in order, when the primary is unreachable.
    pub public_nodes: Vec<Url>,
    /// Fallback to `public_nodes` is opt-in.
    pub allow_public_fallback: bool,
}

impl ClientConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            public_nodes: Vec::new(),
            allow_public_fallback: false,
        }
    }

    /// Nodes to try for a request, primary first.
    pub fn nodes(&self) -> impl Iterator<Item = &Url> {
        let fallback: &[Url] = if self.allow_public_fallback {
            &self.public_nodes
        } else {
            &[]
        };
        std::iter::once(&self.base_url).chain(fallback.iter())
    }
}
