// QDN (arbitrary data) metadata search

use super::{
    address_schema, backend_failure, json_schema_integer, json_schema_object, limit_schema,
    parse_args, Tool, ToolLimits, ToolOutcome, INVALID_ADDRESS, INVALID_PARAMETERS,
};
use crate::protocol::ToolSchema;
use crate::validators::{clamp_limit, is_valid_qortal_address};
use anyhow::Result;
use qortal_client::{QdnSearchQuery, QortalClient};
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArgs {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    service: Option<i64>,
    #[serde(default)]
    limit: Option<i64>,
}

/// Metadata-only search over published QDN resources. Never returns the
/// resource payloads themselves.
pub struct SearchQdnTool {
    client: QortalClient,
    limits: ToolLimits,
}

impl SearchQdnTool {
    pub fn new(client: QortalClient, limits: ToolLimits) -> Self {
        Self { client, limits }
    }
}

#[async_trait::async_trait]
impl Tool for SearchQdnTool {
    fn schema(&self) -> ToolSchema {
        let mut input_schema = json_schema_object(
            json!({
                "address": address_schema("Publisher address (Q-prefixed Base58)"),
                "service": json_schema_integer("Service code (0-65535)", 0, Some(65535)),
                "limit": limit_schema(self.limits.max_qdn_results)
            }),
            vec![],
        );
        input_schema["anyOf"] = json!([{"required": ["address"]}, {"required": ["service"]}]);

        ToolSchema {
            name: "search_qdn".to_string(),
            description: "Search QDN/arbitrary metadata by address and/or service.".to_string(),
            input_schema,
        }
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        let Some(args) = parse_args::<SearchArgs>("search_qdn", arguments) else {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        };

        let address = args
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());
        if address.is_none() && args.service.is_none() {
            return Ok(ToolOutcome::failure(
                "At least one of address or service is required.",
            ));
        }
        if address.is_some_and(|a| !is_valid_qortal_address(a)) {
            return Ok(ToolOutcome::failure(INVALID_ADDRESS));
        }
        let service = match args.service.map(u16::try_from) {
            None => None,
            Some(Ok(code)) => Some(code),
            Some(Err(_)) => return Ok(ToolOutcome::failure("Invalid service code.")),
        };

        let limit = clamp_limit(
            args.limit,
            self.limits.default_qdn_results,
            self.limits.max_qdn_results,
        );
        let query = QdnSearchQuery {
            address: address.map(str::to_string),
            service,
            limit: Some(limit),
        };

        let raw = match self.client.arbitrary().search(&query).await {
            Ok(raw) => raw,
            Err(e) => return backend_failure("search_qdn", e),
        };

        let results: Vec<Value> = raw
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|entry| entry.is_object())
            .take(limit as usize)
            .map(|entry| {
                let field = |key: &str| entry.get(key).cloned().unwrap_or(Value::Null);
                json!({
                    "signature": field("signature"),
                    "publisher": field("publisher"),
                    "service": field("service"),
                    "timestamp": field("timestamp"),
                })
            })
            .collect();

        Ok(ToolOutcome::success(results))
    }
}
