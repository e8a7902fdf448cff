// Node status and identity tools

use super::{
    backend_failure, first_present, json_schema_object, parse_args, to_bool, to_int, Tool,
    ToolOutcome, INVALID_PARAMETERS,
};
use crate::protocol::ToolSchema;
use anyhow::Result;
use qortal_client::QortalClient;
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

fn no_args_schema(name: &str, description: &str) -> ToolSchema {
    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json_schema_object(json!({}), vec![]),
    }
}

/// Synchronization and connectivity summary from `/admin/status`.
pub struct NodeStatusTool {
    client: QortalClient,
}

impl NodeStatusTool {
    pub fn new(client: QortalClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for NodeStatusTool {
    fn schema(&self) -> ToolSchema {
        no_args_schema(
            "get_node_status",
            "Summarize node synchronization and connectivity state.",
        )
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        if parse_args::<NoArgs>("get_node_status", arguments).is_none() {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        }

        let raw = match self.client.node().status().await {
            Ok(raw) => raw,
            Err(e) => return backend_failure("get_node_status", e),
        };

        let sync_percent = match raw.get("syncPercent") {
            None | Some(Value::Null) => Value::Null,
            value => to_int(value).unwrap_or(0).into(),
        };

        Ok(ToolOutcome::success(json!({
            "height": to_int(first_present(&raw, &["height", "chainHeight"])).unwrap_or(0),
            "isSynchronizing": to_bool(first_present(
                &raw,
                &["isSynchronizing", "isSynchronising", "syncing"],
            )),
            "syncPercent": sync_percent,
            "isMintingPossible": to_bool(first_present(&raw, &["isMintingPossible", "mintingPossible"])),
            "numberOfConnections": to_int(first_present(&raw, &["numberOfConnections", "connections"]))
                .unwrap_or(0),
        })))
    }
}

/// Build version, uptime and identifiers from `/admin/info`.
pub struct NodeInfoTool {
    client: QortalClient,
}

impl NodeInfoTool {
    pub fn new(client: QortalClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for NodeInfoTool {
    fn schema(&self) -> ToolSchema {
        no_args_schema("get_node_info", "Return node version, uptime, and identifiers.")
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        if parse_args::<NoArgs>("get_node_info", arguments).is_none() {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        }

        let raw = match self.client.node().info().await {
            Ok(raw) => raw,
            Err(e) => return backend_failure("get_node_info", e),
        };

        let field = |key: &str| raw.get(key).cloned().unwrap_or(Value::Null);
        Ok(ToolOutcome::success(json!({
            "buildVersion": field("buildVersion"),
            "buildTimestamp": field("buildTimestamp"),
            "uptime": field("uptime"),
            "currentTime": field("currentTimestamp"),
            "nodeId": field("nodeId"),
        })))
    }
}

pub struct NodeSummaryTool {
    client: QortalClient,
}

impl NodeSummaryTool {
    pub fn new(client: QortalClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for NodeSummaryTool {
    fn schema(&self) -> ToolSchema {
        no_args_schema("get_node_summary", "Return node summary information.")
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        if parse_args::<NoArgs>("get_node_summary", arguments).is_none() {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        }

        match self.client.node().summary().await {
            Ok(summary) => Ok(ToolOutcome::success(summary)),
            Err(e) => backend_failure("get_node_summary", e),
        }
    }
}

pub struct NodeUptimeTool {
    client: QortalClient,
}

impl NodeUptimeTool {
    pub fn new(client: QortalClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for NodeUptimeTool {
    fn schema(&self) -> ToolSchema {
        no_args_schema("get_node_uptime", "Return node uptime info.")
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome> {
        if parse_args::<NoArgs>("get_node_uptime", arguments).is_none() {
            return Ok(ToolOutcome::failure(INVALID_PARAMETERS));
        }

        let raw = match self.client.node().uptime().await {
            Ok(raw) => raw,
            Err(e) => return backend_failure("get_node_uptime", e),
        };

        // Core answers with a bare number of milliseconds.
        let uptime = match raw {
            Value::Object(mut map) => map.remove("uptime").unwrap_or(Value::Null),
            other => other,
        };
        Ok(ToolOutcome::success(json!({ "uptime": uptime })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{args, client_for, dead_client};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(route: &str, status: u16, body: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_status_normalizes_legacy_fields() {
        let server = serve(
            "/admin/status",
            200,
            json!({
                "chainHeight": "1200",
                "isSynchronising": "true",
                "syncPercent": 99.6,
                "mintingPossible": false,
                "connections": 8
            }),
        )
        .await;

        let outcome = NodeStatusTool::new(client_for(&server))
            .execute(Map::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ToolOutcome::success(json!({
                "height": 1200,
                "isSynchronizing": true,
                "syncPercent": 99,
                "isMintingPossible": false,
                "numberOfConnections": 8
            }))
        );
    }

    #[tokio::test]
    async fn test_status_without_sync_percent() {
        let server = serve("/admin/status", 200, json!({"height": 5})).await;

        let outcome = NodeStatusTool::new(client_for(&server))
            .execute(Map::new())
            .await
            .unwrap();

        let ToolOutcome::Success(value) = outcome else {
            panic!("expected success");
        };
        assert_eq!(value["syncPercent"], Value::Null);
        assert_eq!(value["numberOfConnections"], 0);
    }

    #[tokio::test]
    async fn test_status_unauthorized() {
        let server = serve("/admin/status", 401, json!({"error": "API_KEY"})).await;

        let outcome = NodeStatusTool::new(client_for(&server))
            .execute(Map::new())
            .await
            .unwrap();
        assert_eq!(outcome, ToolOutcome::failure("Unauthorized or API key required."));
    }

    #[tokio::test]
    async fn test_info_maps_current_timestamp() {
        let server = serve(
            "/admin/info",
            200,
            json!({
                "buildVersion": "qortal-5.0.6-dfa1e57",
                "buildTimestamp": 123,
                "uptime": 456,
                "currentTimestamp": 789,
                "nodeId": "abc"
            }),
        )
        .await;

        let outcome = NodeInfoTool::new(client_for(&server))
            .execute(Map::new())
            .await
            .unwrap();

        let ToolOutcome::Success(value) = outcome else {
            panic!("expected success");
        };
        assert_eq!(value["buildVersion"], "qortal-5.0.6-dfa1e57");
        assert_eq!(value["currentTime"], 789);
        assert_eq!(value["nodeId"], "abc");
    }

    #[tokio::test]
    async fn test_summary_passes_through() {
        let summary = json!({"blockCount": 3, "transactionCountByType": {"PAYMENT": 2}});
        let server = serve("/admin/summary", 200, summary.clone()).await;

        let outcome = NodeSummaryTool::new(client_for(&server))
            .execute(Map::new())
            .await
            .unwrap();
        assert_eq!(outcome, ToolOutcome::Success(summary));
    }

    #[tokio::test]
    async fn test_uptime_wraps_bare_number() {
        let server = serve("/admin/uptime", 200, json!(86400000)).await;

        let outcome = NodeUptimeTool::new(client_for(&server))
            .execute(Map::new())
            .await
            .unwrap();
        assert_eq!(outcome, ToolOutcome::success(json!({"uptime": 86400000})));
    }

    #[tokio::test]
    async fn test_unknown_arguments_are_rejected() {
        let outcome = NodeInfoTool::new(dead_client())
            .execute(args(json!({"verbose": true})))
            .await
            .unwrap();
        assert_eq!(outcome, ToolOutcome::failure("Invalid parameters."));
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        let outcome = NodeUptimeTool::new(dead_client())
            .execute(Map::new())
            .await
            .unwrap();
        assert_eq!(outcome, ToolOutcome::failure("Node unreachable"));
    }
}
