// MCP request dispatcher (JSON-RPC 2.0, one envelope per call)

use crate::error::RpcFailure;
use crate::handshake::{negotiate, VersionPolicy};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerInfo, JSONRPC_VERSION};
use crate::rate_limit::{RateLimitSurface, RateLimiter};
use crate::response;
use crate::tools::{Tool, ToolOutcome, ToolRegistry};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(10);

const TIMEOUT_MESSAGE: &str = "backend unreachable";
const INTERNAL_MESSAGE: &str = "internal error";

/// Behavior switches of the dispatcher.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub server_info: ServerInfo,
    pub version_policy: VersionPolicy,
    pub rate_limit_surface: RateLimitSurface,
    /// Upper bound on a single tool invocation.
    pub tool_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server_info: ServerInfo::default(),
            version_policy: VersionPolicy::default(),
            rate_limit_surface: RateLimitSurface::default(),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

/// The closed set of methods this server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    ListTools,
    CallTool,
    /// Client acknowledgement after `initialize`; never answered.
    Initialized,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "tools/list" | "list_tools" => Some(Self::ListTools),
            "tools/call" | "call_tool" => Some(Self::CallTool),
            "notifications/initialized" | "initialized" => Some(Self::Initialized),
            _ => None,
        }
    }
}

/// How a call ended, for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success,
    /// The tool ran (or was attempted) and reported `isError: true`.
    ToolError,
    RateLimited,
    ProtocolError(i32),
    /// Notification; nothing was sent back.
    Ignored,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ToolError => "tool_error",
            Self::RateLimited => "rate_limited",
            Self::ProtocolError(_) => "protocol_error",
            Self::Ignored => "ignored",
        }
    }

    pub fn error_code(&self) -> Option<i32> {
        match self {
            Self::ProtocolError(code) => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub method: Option<String>,
    pub tool: Option<String>,
    pub outcome: DispatchOutcome,
}

/// Result of handling one request body.
#[derive(Debug, Clone)]
pub struct Dispatch {
    /// `None` for notifications.
    pub response: Option<JsonRpcResponse>,
    pub report: DispatchReport,
}

impl Dispatch {
    fn reply(response: JsonRpcResponse, method: Option<String>, tool: Option<String>, outcome: DispatchOutcome) -> Self {
        Self {
            response: Some(response),
            report: DispatchReport {
                method,
                tool,
                outcome,
            },
        }
    }

    fn failure(id: Value, method: Option<String>, tool: Option<String>, failure: RpcFailure) -> Self {
        let outcome = match failure {
            RpcFailure::RateLimited => DispatchOutcome::RateLimited,
            ref other => DispatchOutcome::ProtocolError(other.code()),
        };
        Self::reply(JsonRpcResponse::error(id, failure.into()), method, tool, outcome)
    }

    fn ignored(method: String) -> Self {
        Self {
            response: None,
            report: DispatchReport {
                method: Some(method),
                tool: None,
                outcome: DispatchOutcome::Ignored,
            },
        }
    }
}

/// Routes JSON-RPC envelopes to the handshake, the tool listing or a tool.
///
/// Holds no per-session state: any request may arrive first and requests
/// are never ordered relative to each other.
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    limiter: Arc<RateLimiter>,
    config: GatewayConfig,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, limiter: RateLimiter, config: GatewayConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            limiter: Arc::new(limiter),
            config,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Handle a raw request body.
    pub async fn handle(&self, body: &[u8]) -> Dispatch {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => {
                tracing::debug!(error = %e, "Request body is not JSON");
                Dispatch::failure(Value::Null, None, None, RpcFailure::ParseError)
            }
        }
    }

    /// Handle an already decoded JSON value.
    pub async fn handle_value(&self, value: Value) -> Dispatch {
        match parse_envelope(value) {
            Ok(request) => self.handle_request(request).await,
            Err((id, failure)) => Dispatch::failure(id, None, None, failure),
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Dispatch {
        let notification = request.is_notification();
        let id = request.id.unwrap_or(Value::Null);
        let name = request.method;

        let method = match Method::from_name(&name) {
            Some(Method::Initialized) => return Dispatch::ignored(name),
            Some(_) if notification => {
                tracing::debug!(method = %name, "Ignoring notification for a request method");
                return Dispatch::ignored(name);
            }
            Some(method) => method,
            None if notification => return Dispatch::ignored(name),
            None => return Dispatch::failure(id, Some(name), None, RpcFailure::MethodNotFound),
        };

        let params = match request.params {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                return Dispatch::failure(
                    id,
                    Some(name),
                    None,
                    RpcFailure::InvalidParams("params must be an object"),
                )
            }
        };

        match method {
            Method::Initialize => {
                let result = negotiate(
                    params.as_ref(),
                    self.config.version_policy,
                    &self.config.server_info,
                )
                .and_then(|result| to_result_value(&result));
                match result {
                    Ok(result) => Dispatch::reply(
                        JsonRpcResponse::success(id, result),
                        Some(name),
                        None,
                        DispatchOutcome::Success,
                    ),
                    Err(failure) => Dispatch::failure(id, Some(name), None, failure),
                }
            }
            Method::ListTools => {
                let listing = ListToolsResult {
                    tools: self.registry.list_schemas().to_vec(),
                };
                match to_result_value(&listing) {
                    Ok(result) => Dispatch::reply(
                        JsonRpcResponse::success(id, result),
                        Some(name),
                        None,
                        DispatchOutcome::Success,
                    ),
                    Err(failure) => Dispatch::failure(id, Some(name), None, failure),
                }
            }
            Method::CallTool => self.call_tool(id, name, params).await,
            Method::Initialized => Dispatch::ignored(name),
        }
    }

    async fn call_tool(&self, id: Value, method: String, params: Option<Map<String, Value>>) -> Dispatch {
        let Some(mut params) = params else {
            return Dispatch::failure(id, Some(method), None, RpcFailure::InvalidParams("missing params"));
        };

        let Some(tool_name) = ["name", "tool"]
            .iter()
            .find_map(|key| params.get(*key).and_then(Value::as_str))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            return Dispatch::failure(id, Some(method), None, RpcFailure::InvalidParams("missing tool name"));
        };

        let arguments = match params.remove("arguments").or_else(|| params.remove("params")) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(arguments)) => arguments,
            Some(_) => {
                return Dispatch::failure(
                    id,
                    Some(method),
                    Some(tool_name),
                    RpcFailure::InvalidParams("arguments must be an object"),
                )
            }
        };

        // Lookup before admission keeps unknown names out of the bucket map.
        let Some(tool) = self.registry.get(&tool_name) else {
            tracing::debug!(tool = %tool_name, "Unknown tool requested");
            let failure = RpcFailure::UnknownTool(tool_name.clone());
            return Dispatch::failure(id, Some(method), Some(tool_name), failure);
        };

        if !self.limiter.check(&tool_name) {
            tracing::warn!(tool = %tool_name, "Rate limit exceeded");
            return match self.config.rate_limit_surface {
                RateLimitSurface::ProtocolError => {
                    Dispatch::failure(id, Some(method), Some(tool_name), RpcFailure::RateLimited)
                }
                RateLimitSurface::ToolError => match to_result_value(&response::rate_limited(&tool_name)) {
                    Ok(result) => Dispatch::reply(
                        JsonRpcResponse::success(id, result),
                        Some(method),
                        Some(tool_name),
                        DispatchOutcome::RateLimited,
                    ),
                    Err(failure) => Dispatch::failure(id, Some(method), Some(tool_name), failure),
                },
            };
        }

        let outcome = self.invoke(&tool_name, tool, arguments).await;
        let dispatch_outcome = if outcome.is_failure() {
            DispatchOutcome::ToolError
        } else {
            DispatchOutcome::Success
        };

        let shaped = response::shape(outcome)
            .map_err(|e| {
                tracing::error!(tool = %tool_name, error = %e, "Failed to render tool result");
                RpcFailure::Internal
            })
            .and_then(|result| to_result_value(&result));

        match shaped {
            Ok(result) => Dispatch::reply(
                JsonRpcResponse::success(id, result),
                Some(method),
                Some(tool_name),
                dispatch_outcome,
            ),
            Err(failure) => Dispatch::failure(id, Some(method), Some(tool_name), failure),
        }
    }

    /// Run a tool under the configured timeout, turning errors and panics
    /// into generic failures. Details only go to the log.
    async fn invoke(&self, name: &str, tool: Arc<dyn Tool>, arguments: Map<String, Value>) -> ToolOutcome {
        let call = AssertUnwindSafe(tool.execute(arguments)).catch_unwind();

        match tokio::time::timeout(self.config.tool_timeout, call).await {
            Ok(Ok(Ok(outcome))) => outcome,
            Ok(Ok(Err(e))) => {
                tracing::error!(tool = name, error = ?e, "Tool execution failed");
                ToolOutcome::failure(INTERNAL_MESSAGE)
            }
            Ok(Err(_)) => {
                tracing::error!(tool = name, "Tool panicked");
                ToolOutcome::failure(INTERNAL_MESSAGE)
            }
            Err(_) => {
                tracing::warn!(
                    tool = name,
                    timeout_ms = self.config.tool_timeout.as_millis() as u64,
                    "Tool timed out"
                );
                ToolOutcome::failure(TIMEOUT_MESSAGE)
            }
        }
    }
}

fn to_result_value<T: serde::Serialize>(result: &T) -> Result<Value, RpcFailure> {
    serde_json::to_value(result).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize result");
        RpcFailure::Internal
    })
}

/// Validate the JSON-RPC envelope. On failure, returns the id to answer
/// with (null when the id itself is unusable).
fn parse_envelope(value: Value) -> Result<JsonRpcRequest, (Value, RpcFailure)> {
    let Value::Object(mut envelope) = value else {
        return Err((Value::Null, RpcFailure::InvalidRequest));
    };

    let id = match envelope.remove("id") {
        None | Some(Value::Null) => None,
        Some(id @ (Value::String(_) | Value::Number(_))) => Some(id),
        Some(_) => return Err((Value::Null, RpcFailure::InvalidRequest)),
    };
    let reply_id = id.clone().unwrap_or(Value::Null);

    if envelope.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err((reply_id, RpcFailure::InvalidRequest));
    }

    let method = match envelope.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => return Err((reply_id, RpcFailure::InvalidRequest)),
    };

    Ok(JsonRpcRequest {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        method,
        params: envelope.remove("params"),
    })
}
