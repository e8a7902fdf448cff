mod account;
mod names;
mod node;
mod qdn;
mod registry;
mod trade;

pub use account::{AccountOverviewTool, BalanceTool, ValidateAddressTool};
pub use names::{NameInfoTool, NamesByAddressTool};
pub use node::{NodeInfoTool, NodeStatusTool, NodeSummaryTool, NodeUptimeTool};
pub use qdn::SearchQdnTool;
pub use registry::{
    json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string, Tool,
    ToolOutcome, ToolRegistry,
};
pub use trade::TradeOffersTool;

use crate::error::RegistryError;
use crate::validators::{ADDRESS_LENGTH, ADDRESS_PATTERN};
use qortal_client::{QortalClient, QortalError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub(crate) const INVALID_PARAMETERS: &str = "Invalid parameters.";
pub(crate) const INVALID_ADDRESS: &str = "Invalid Qortal address.";
pub(crate) const API_ERROR: &str = "Qortal API error.";

/// Caps applied to list-shaped tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolLimits {
    pub max_names: u32,
    pub max_trade_offers: u32,
    pub default_trade_offers: u32,
    pub max_qdn_results: u32,
    pub default_qdn_results: u32,
    /// Longest name `data` returned before truncation, in characters.
    pub max_name_data_preview: usize,
}

impl Default for ToolLimits {
    fn default() -> Self {
        Self {
            max_names: 100,
            max_trade_offers: 100,
            default_trade_offers: 25,
            max_qdn_results: 100,
            default_qdn_results: 25,
            max_name_data_preview: 1024,
        }
    }
}

/// Register the Qortal tool set in its advertised order.
pub fn register_qortal_tools(
    registry: &mut ToolRegistry,
    client: QortalClient,
    limits: ToolLimits,
) -> Result<(), RegistryError> {
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(NodeStatusTool::new(client.clone())),
        Arc::new(NodeInfoTool::new(client.clone())),
        Arc::new(NodeSummaryTool::new(client.clone())),
        Arc::new(NodeUptimeTool::new(client.clone())),
        Arc::new(AccountOverviewTool::new(client.clone(), limits.clone())),
        Arc::new(BalanceTool::new(client.clone())),
        Arc::new(ValidateAddressTool),
        Arc::new(NameInfoTool::new(client.clone(), limits.clone())),
        Arc::new(NamesByAddressTool::new(client.clone(), limits.clone())),
        Arc::new(TradeOffersTool::new(client.clone(), limits.clone())),
        Arc::new(SearchQdnTool::new(client, limits)),
    ];

    for tool in tools {
        registry.register(tool)?;
    }
    Ok(())
}

/// Deserialize call arguments, `None` when they do not fit the tool.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Map<String, Value>) -> Option<T> {
    match serde_json::from_value(Value::Object(arguments)) {
        Ok(args) => Some(args),
        Err(e) => {
            tracing::debug!(tool, error = %e, "Rejected tool arguments");
            None
        }
    }
}

/// Map a client error to the message shown to the caller.
///
/// Configuration problems are not the caller's fault and bubble up as
/// internal errors.
pub(crate) fn backend_failure(tool: &str, err: QortalError) -> anyhow::Result<ToolOutcome> {
    match err {
        QortalError::Config(_) | QortalError::InvalidUrl(_) => Err(err.into()),
        QortalError::UnexpectedResponse { status } => {
            tracing::warn!(tool, status, "Node returned a non-JSON body");
            Ok(ToolOutcome::failure(API_ERROR))
        }
        other => {
            tracing::debug!(tool, error = ?other, "Backend call failed");
            Ok(ToolOutcome::failure(other.to_string()))
        }
    }
}

fn address_schema(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description,
        "pattern": ADDRESS_PATTERN,
        "minLength": ADDRESS_LENGTH,
        "maxLength": ADDRESS_LENGTH
    })
}

fn limit_schema(max: u32) -> Value {
    json_schema_integer(&format!("Optional max items (0-{max})"), 0, Some(i64::from(max)))
}

/// Loose truthiness of a node field: null, false, zero and empty values
/// count as absent.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First field among `keys` holding a truthy value. Core renamed several
/// fields across releases.
fn first_present<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| raw.get(*key)).find(|v| truthy(v))
}

fn to_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn to_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y"
        ),
        Some(other) => truthy(other),
        None => false,
    }
}

/// Render a scalar as the string Core would have sent.
fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Items of a list payload, accepting both a bare array and `{ "<key>": [...] }`.
fn list_items<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    let source = match raw {
        Value::Object(map) => map.get(key),
        other => Some(other),
    };
    source
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Registered names from a names payload; entries are objects with a `name`
/// field or bare strings.
fn extract_names(raw: &Value, max: usize) -> Vec<String> {
    list_items(raw, "names")
        .iter()
        .take(max)
        .filter_map(|item| match item {
            Value::Object(map) => map.get("name").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use qortal_client::QortalClient;
    use serde_json::{Map, Value};
    use wiremock::MockServer;

    pub const ADDRESS: &str = "QgB7zMfujQMLkisp1Lc8PBkVYs75sYB3vV";

    pub fn client_for(server: &MockServer) -> QortalClient {
        QortalClient::builder()
            .base_url(server.uri())
            .build()
            .unwrap()
    }

    /// Client pointed at a port nothing listens on.
    pub fn dead_client() -> QortalClient {
        QortalClient::builder()
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap()
    }

    pub fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }
}
