use crate::metrics::MetricsRecorder;
use anyhow::{bail, Context, Result};
use qortal_client::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use qortal_client::QortalClient;
use qortal_mcp::{
    register_qortal_tools, GatewayConfig, McpServer, RateLimitConfig, RateLimitSurface,
    RateLimiter, ToolLimits, ToolRegistry, VersionPolicy,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_KEY_FILE: &str = "apikey.txt";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub qortal: QortalConfig,

    #[serde(default)]
    pub limits: ToolLimits,

    #[serde(default)]
    pub rate_limit: RateLimitSection,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection to the Qortal Core node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Read when no key is configured directly.
    #[serde(default = "default_api_key_file")]
    pub api_key_file: PathBuf,

    #[serde(default)]
    pub public_nodes: Vec<String>,

    #[serde(default)]
    pub allow_public_fallback: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_api_key_file() -> PathBuf {
    PathBuf::from(DEFAULT_API_KEY_FILE)
}

impl Default for QortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
            api_key_file: default_api_key_file(),
            public_nodes: Vec::new(),
            allow_public_fallback: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitSection {
    #[serde(flatten)]
    pub buckets: RateLimitConfig,

    #[serde(default)]
    pub surface: RateLimitSurface,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySection {
    #[serde(default)]
    pub version_policy: VersionPolicy,

    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

fn default_tool_timeout_secs() -> u64 {
    qortal_mcp::server::DEFAULT_TOOL_TIMEOUT.as_secs()
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            version_policy: VersionPolicy::default(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// Default filter directive; `RUST_LOG` still wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Load the config file (defaults when it does not exist), apply
    /// environment overrides, resolve the API key and validate.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.resolve_api_key()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!("Configuration file not found, using defaults");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read configuration file")?;
        toml::from_str(&content).context("Failed to parse configuration file")
    }

    /// Apply `QORTAL_*` overrides looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("QORTAL_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.qortal.base_url = url.trim().to_string();
        }

        if let Some(raw) = var("QORTAL_HTTP_TIMEOUT") {
            self.qortal.timeout_secs = match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(value = %raw, "Invalid QORTAL_HTTP_TIMEOUT, using default");
                    default_timeout_secs()
                }
            };
        }

        if let Some(key) = var("QORTAL_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.qortal.api_key = Some(key.trim().to_string());
        }

        if let Some(path) = var("QORTAL_API_KEY_FILE").filter(|v| !v.trim().is_empty()) {
            self.qortal.api_key_file = PathBuf::from(path.trim());
        }

        if let Some(nodes) = var("QORTAL_PUBLIC_NODES") {
            self.qortal.public_nodes = nodes
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(flag) = var("QORTAL_ALLOW_PUBLIC_FALLBACK") {
            self.qortal.allow_public_fallback = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        if let Some(format) = var("QORTAL_LOG_FORMAT") {
            match format.trim().to_ascii_lowercase().as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "text" => self.logging.format = LogFormat::Text,
                other => tracing::warn!(value = other, "Unknown QORTAL_LOG_FORMAT, ignoring"),
            }
        }

        if let Some(level) = var("QORTAL_LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
            self.logging.level = level.trim().to_string();
        }
    }

    /// Fall back to the key file when no key was given directly. A missing
    /// file is not an error; admin-only tools will report the node's 401.
    pub fn resolve_api_key(&mut self) -> Result<()> {
        if self.qortal.api_key.is_some() {
            return Ok(());
        }

        let path = &self.qortal.api_key_file;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No API key file");
            return Ok(());
        }

        let key = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read API key file {}", path.display()))?;
        let key = key.trim();
        if !key.is_empty() {
            self.qortal.api_key = Some(key.to_string());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.qortal.timeout_secs == 0 {
            bail!("qortal.timeout_secs must be greater than zero");
        }
        if self.gateway.tool_timeout_secs == 0 {
            bail!("gateway.tool_timeout_secs must be greater than zero");
        }

        let buckets = &self.rate_limit.buckets;
        let all = std::iter::once(("default", &buckets.default))
            .chain(buckets.per_tool.iter().map(|(name, b)| (name.as_str(), b)))
            .chain(buckets.global.iter().map(|b| ("global", b)));
        for (name, bucket) in all {
            if bucket.capacity == 0 {
                bail!("rate_limit capacity for '{name}' must be at least 1");
            }
            if !bucket.refill_per_second.is_finite() || bucket.refill_per_second < 0.0 {
                bail!("rate_limit refill_per_second for '{name}' must be a non-negative number");
            }
        }

        if self.limits.default_trade_offers > self.limits.max_trade_offers {
            bail!("limits.default_trade_offers exceeds limits.max_trade_offers");
        }
        if self.limits.default_qdn_results > self.limits.max_qdn_results {
            bail!("limits.default_qdn_results exceeds limits.max_qdn_results");
        }
        Ok(())
    }

    pub fn build_client(&self) -> Result<QortalClient> {
        let mut builder = QortalClient::builder()
            .base_url(self.qortal.base_url.clone())
            .timeout(Duration::from_secs(self.qortal.timeout_secs))
            .allow_public_fallback(self.qortal.allow_public_fallback);

        if let Some(key) = &self.qortal.api_key {
            builder = builder.api_key(key.clone());
        }
        for node in &self.qortal.public_nodes {
            builder = builder.public_node(node.clone());
        }

        builder.build().context("Failed to create Qortal client")
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            version_policy: self.gateway.version_policy,
            rate_limit_surface: self.rate_limit.surface,
            tool_timeout: Duration::from_secs(self.gateway.tool_timeout_secs),
            ..Default::default()
        }
    }
}

/// Application state shared across handlers
pub struct AppState {
    pub server: McpServer,
    pub metrics: MetricsRecorder,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = config.build_client()?;

        let mut registry = ToolRegistry::new();
        register_qortal_tools(&mut registry, client, config.limits.clone())
            .context("Failed to register tools")?;

        let limiter = RateLimiter::new(config.rate_limit.buckets.clone());
        let server = McpServer::new(registry, limiter, config.gateway_config());

        Ok(Self {
            server,
            metrics: MetricsRecorder::new(),
        })
    }
}
