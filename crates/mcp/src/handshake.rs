// MCP initialize handshake

use crate::error::RpcFailure;
use crate::protocol::{InitializeResult, ServerCapabilities, ServerInfo, ToolsCapability};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revisions this server has been exercised against.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// How to answer a client requesting a protocol revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// Echo whatever the client asked for. The tool surface does not differ
    /// between revisions.
    #[default]
    Echo,
    /// Reject revisions outside `SUPPORTED_PROTOCOL_VERSIONS`.
    Strict,
}

/// Produce the `initialize` result for the given request params.
///
/// `capabilities` and `clientInfo` are accepted and ignored.
pub fn negotiate(
    params: Option<&serde_json::Map<String, Value>>,
    policy: VersionPolicy,
    server_info: &ServerInfo,
) -> Result<InitializeResult, RpcFailure> {
    let params = params.ok_or(RpcFailure::InvalidParams("missing params"))?;

    let requested = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or(RpcFailure::InvalidParams(
            "protocolVersion must be a non-empty string",
        ))?;

    if policy == VersionPolicy::Strict && !SUPPORTED_PROTOCOL_VERSIONS.contains(&requested) {
        return Err(RpcFailure::InvalidParams("unsupported protocolVersion"));
    }

    Ok(InitializeResult {
        protocol_version: requested.to_string(),
        server_info: server_info.clone(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
        },
    })
}
