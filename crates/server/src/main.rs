use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod metrics;
mod middleware;

use config::{AppState, LogFormat, LoggingConfig, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "qortal-mcp")]
#[command(about = "Read-only MCP gateway for the Qortal Core API", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "QORTAL_MCP_CONFIG", default_value = "qortal-mcp.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "QORTAL_MCP_PORT", default_value = "8000")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "QORTAL_MCP_HOST", default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = ServerConfig::load(&args.config)?;
    init_tracing(&config.logging);

    tracing::info!("Starting Qortal MCP gateway");
    tracing::info!(
        base_url = %config.qortal.base_url,
        public_nodes = config.qortal.public_nodes.len(),
        api_key = config.qortal.api_key.is_some(),
        "Qortal node configured"
    );

    let state = AppState::new(&config)?;
    tracing::info!("Registered {} tools", state.server.registry().len());

    let addr = format!("{}:{}", args.host, args.port);
    api::serve(&addr, state).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
