// Registered name tools

use super::{
    address_schema, backend_failure, extract_names, json_schema_boolean, json_schema_integer,
    json_schema_object, limit_schema, parse_args, truthy, Tool, ToolLimits, ToolOutcome,
    INVALID_ADDRESS, INVALID_PARAMETERS,
};
use crate::protocol::ToolSchema;
use crate::validators::{
    clamp_limit, is_valid_qortal_address, is_valid_qortal_name, NAME_MAX_LENGTH, NAME_MIN_LENGTH,
    NAME_PATTERN,
};
use anyhow::Result;
use qortal_client::{NamesQuery, QortalClient, QortalError};
use serde::Deserialize;
use serde_json::{json, Map, Value};

const TRUNCATION_MARKER: &str = "... (truncated)";

/// Cut `data` so the result, marker included, fits in `max_chars`.
fn truncate_data(data: &str, max_chars: usize) -> String {
    if data.chars().count() <= max_chars {
        return data.to_string();
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.len());
    let mut out: String = data.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NameArgs {
    name: String,
}

pub struct NameInfoTool {
    client: QortalClient,
    limits: ToolLimits,
}

impl NameInfoTool {
    pub fn new(client: QortalClient, limits: ToolLimits) -> Self {
        Self { client, limits }
    }
}

#[async_trait::async_trait]
impl Tool for NameInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_name_info".to_string(),
            description: "Return details about a registered name.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "name": {
                        "type": "string",
                        "description": "Registered Qortal name",
                        "pattern": NAME_PATTERN,
                        "minLength": NAME_MIN_LENGTH,
                        "maxLength": NAME_MAX_LENGTH
                    }
                }),
                vec!["name"],
            ),
        }
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        let Some(args) = parse_args::<NameArgs>("get_name_info", arguments) else {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        };
        if !is_valid_qortal_name(&args.name) {
            return Ok(ToolOutcome::failure("Invalid name."));
        }
        let name = args.name.trim();

        let raw = match self.client.names().info(name).await {
            Ok(raw) => raw,
            Err(QortalError::AddressNotFound { .. } | QortalError::NameNotFound { .. }) => {
                return Ok(ToolOutcome::failure("Name not found."));
            }
            Err(QortalError::InvalidAddress { .. }) => {
                return Ok(ToolOutcome::failure("Invalid name."));
            }
            Err(e) => return backend_failure("get_name_info", e),
        };

        let data = raw
            .get("data")
            .and_then(Value::as_str)
            .map(|d| truncate_data(d, self.limits.max_name_data_preview));

        Ok(ToolOutcome::success(json!({
            "name": raw.get("name").filter(|v| truthy(v)).cloned().unwrap_or_else(|| name.into()),
            "owner": raw.get("owner").cloned().unwrap_or(Value::Null),
            "data": data,
            "isForSale": raw.get("isForSale").is_some_and(truthy),
            "salePrice": raw.get("salePrice").cloned().unwrap_or(Value::Null),
        })))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NamesByAddressArgs {
    address: String,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,
    #[serde(default)]
    reverse: Option<bool>,
}

pub struct NamesByAddressTool {
    client: QortalClient,
    limits: ToolLimits,
}

impl NamesByAddressTool {
    pub fn new(client: QortalClient, limits: ToolLimits) -> Self {
        Self { client, limits }
    }
}

#[async_trait::async_trait]
impl Tool for NamesByAddressTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_names_by_address".to_string(),
            description: "List names owned by an address (limit enforced).".to_string(),
            input_schema: json_schema_object(
                json!({
                    "address": address_schema("Qortal address (Q-prefixed Base58)"),
                    "limit": limit_schema(self.limits.max_names),
                    "offset": json_schema_integer("Offset for pagination (optional)", 0, None),
                    "reverse": json_schema_boolean("Reverse sort order (optional)")
                }),
                vec!["address"],
            ),
        }
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        let Some(args) = parse_args::<NamesByAddressArgs>("get_names_by_address", arguments)
        else {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        };
        if !is_valid_qortal_address(&args.address) {
            return Ok(ToolOutcome::failure(INVALID_ADDRESS));
        }
        let address = args.address.trim();
        let limit = clamp_limit(args.limit, self.limits.max_names, self.limits.max_names);

        let query = NamesQuery {
            limit: Some(limit),
            offset: args.offset.and_then(|o| u32::try_from(o).ok()),
            reverse: args.reverse,
        };

        match self.client.names().by_owner(address, &query).await {
            Ok(payload) => Ok(ToolOutcome::success(json!({
                "address": address,
                "names": extract_names(&payload, limit as usize),
            }))),
            Err(e) => backend_failure("get_names_by_address", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{args, client_for, dead_client, ADDRESS};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_name_info_truncates_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/names/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "alice",
                "owner": ADDRESS,
                "data": "x".repeat(100),
                "isForSale": false
            })))
            .mount(&server)
            .await;

        let limits = ToolLimits {
            max_name_data_preview: 40,
            ..Default::default()
        };
        let outcome = NameInfoTool::new(client_for(&server), limits)
            .execute(args(json!({"name": "alice"})))
            .await
            .unwrap();

        let ToolOutcome::Success(value) = outcome else {
            panic!("expected success");
        };
        let data = value["data"].as_str().unwrap();
        assert_eq!(data.len(), 40);
        assert!(data.ends_with("... (truncated)"));
        assert_eq!(value["owner"], ADDRESS);
        assert_eq!(value["isForSale"], false);
        assert_eq!(value["salePrice"], Value::Null);
    }

    #[tokio::test]
    async fn test_name_info_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/names/nobody"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "NAME_UNKNOWN"})))
            .mount(&server)
            .await;

        let outcome = NameInfoTool::new(client_for(&server), ToolLimits::default())
            .execute(args(json!({"name": "nobody"})))
            .await
            .unwrap();
        assert_eq!(outcome, ToolOutcome::failure("Name not found."));
    }

    #[tokio::test]
    async fn test_name_info_rejects_bad_names() {
        let tool = NameInfoTool::new(dead_client(), ToolLimits::default());
        for bad in ["ab", "-leading", "has/slash"] {
            let outcome = tool.execute(args(json!({"name": bad}))).await.unwrap();
            assert_eq!(outcome, ToolOutcome::failure("Invalid name."));
        }
    }

    #[tokio::test]
    async fn test_names_by_address_clamps_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/names/address/{ADDRESS}")))
            .and(query_param("limit", "2"))
            .and(query_param("reverse", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"name": "a"}, {"name": "b"}, {"name": "c"}])),
            )
            .mount(&server)
            .await;

        let limits = ToolLimits {
            max_names: 2,
            ..Default::default()
        };
        let outcome = NamesByAddressTool::new(client_for(&server), limits)
            .execute(args(json!({"address": ADDRESS, "limit": 50, "reverse": true})))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ToolOutcome::success(json!({"address": ADDRESS, "names": ["a", "b"]}))
        );
    }

    #[tokio::test]
    async fn test_names_by_address_invalid_address() {
        let outcome = NamesByAddressTool::new(dead_client(), ToolLimits::default())
            .execute(args(json!({"address": "Qshort"})))
            .await
            .unwrap();
        assert_eq!(outcome, ToolOutcome::failure("Invalid Qortal address."));
    }

    #[test]
    fn test_truncate_short_data_untouched() {
        assert_eq!(truncate_data("hello", 1024), "hello");
        assert_eq!(truncate_data("ééééé", 5), "ééééé");
    }
}
