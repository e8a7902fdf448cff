// MCP (Model Context Protocol) gateway for the Qortal Core API.
// Exposes a fixed catalog of read-only tools to agent clients over JSON-RPC 2.0.

pub mod error;
pub mod handshake;
pub mod protocol;
pub mod rate_limit;
pub mod response;
pub mod server;
pub mod tools;
pub mod validators;

pub use error::{RegistryError, RpcFailure};
pub use handshake::{VersionPolicy, SUPPORTED_PROTOCOL_VERSIONS};
pub use rate_limit::{BucketConfig, RateLimitConfig, RateLimitSurface, RateLimiter};
pub use server::{Dispatch, DispatchOutcome, DispatchReport, GatewayConfig, McpServer, Method};
pub use tools::{register_qortal_tools, Tool, ToolLimits, ToolOutcome, ToolRegistry};
