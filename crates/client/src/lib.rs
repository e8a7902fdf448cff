//! # Qortal client
//!
//! Async client for the read-only subset of the Qortal Core HTTP API used by
//! the MCP gateway.
//!
//! ```rust,no_run
//! use qortal_client::{QortalClient, QortalResult};
//!
//! # async fn example() -> QortalResult<()> {
//! let client = QortalClient::builder()
//!     .base_url("http://localhost:12391")
//!     .build()?;
//!
//! let info = client.node().info().await?;
//! println!("Core build: {}", info["buildVersion"]);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use api::{NamesQuery, QdnSearchQuery, TradeOffersQuery};
pub use client::{QortalClient, QortalClientBuilder};
pub use config::ClientConfig;
pub use error::{QortalError, QortalResult};
