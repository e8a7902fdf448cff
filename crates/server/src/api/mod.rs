use crate::config::AppState;
use crate::metrics::MetricsSnapshot;
use crate::middleware::{request_context, RequestId};
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use qortal_mcp::protocol::{JsonRpcResponse, PARSE_ERROR, RATE_LIMITED};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Start the HTTP server and run until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("MCP gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("MCP gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mcp", post(mcp))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        // Middleware
        .layer(from_fn_with_state(state.clone(), request_context))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JSON-RPC endpoint. The body is handed to the dispatcher as raw bytes so
/// malformed JSON still gets a proper parse error.
async fn mcp(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let dispatch = state.server.handle(&body).await;
    state.metrics.record_dispatch(&dispatch.report);

    let report = &dispatch.report;
    let error_code = dispatch
        .response
        .as_ref()
        .and_then(JsonRpcResponse::error_object)
        .map(|error| error.code);

    tracing::info!(
        request_id = %request_id,
        method = report.method.as_deref().unwrap_or("-"),
        tool = report.tool.as_deref().unwrap_or("-"),
        outcome = report.outcome.as_str(),
        error_code = ?error_code,
        duration_ms = started.elapsed().as_millis() as u64,
        "mcp request"
    );

    match dispatch.response {
        Some(response) => (status_for(error_code), Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// HTTP status for a JSON-RPC reply carrying `error_code` (if any).
fn status_for(error_code: Option<i32>) -> StatusCode {
    match error_code {
        Some(PARSE_ERROR) => StatusCode::BAD_REQUEST,
        Some(RATE_LIMITED) => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::OK,
    }
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::middleware::REQUEST_ID_HEADER;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use qortal_mcp::{BucketConfig, RateLimitSurface};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    const ADDRESS: &str = "QgB7zMfujQMLkisp1Lc8PBkVYs75sYB3vV";

    fn router(config: &ServerConfig) -> Router {
        create_router(Arc::new(AppState::new(config).unwrap()))
    }

    fn rpc(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    fn call(name: &str, arguments: Value) -> Request<Body> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        });
        rpc(body.to_string())
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_sets_request_id() {
        let app = router(&ServerConfig::default());
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {"protocolVersion": "2025-06-18"}
        });

        let response = app.oneshot(rpc(body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request_id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(Uuid::parse_str(request_id).is_ok());

        let body = json_body(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["protocolVersion"], "2025-06-18");
    }

    #[tokio::test]
    async fn test_request_ids_are_unique() {
        let app = router(&ServerConfig::default());
        let health = || Request::get("/health").body(Body::empty()).unwrap();
        let first = app.clone().oneshot(health()).await.unwrap();
        let second = app.oneshot(health()).await.unwrap();

        assert_ne!(
            first.headers()[REQUEST_ID_HEADER],
            second.headers()[REQUEST_ID_HEADER]
        );
    }

    #[tokio::test]
    async fn test_notification_is_no_content() {
        let app = router(&ServerConfig::default());
        let body = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});

        let response = app.oneshot(rpc(body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_parse_error_is_bad_request() {
        let app = router(&ServerConfig::default());

        let response = app.oneshot(rpc("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_method_not_found_is_ok_status() {
        let app = router(&ServerConfig::default());
        let body = json!({"jsonrpc": "2.0", "id": "a", "method": "resources/list"});

        let response = app.oneshot(rpc(body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_validate_address_over_http() {
        let app = router(&ServerConfig::default());

        let response = app
            .oneshot(call("validate_address", json!({"address": "not-an-address"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert!(body["result"].get("isError").is_none());
        assert_eq!(body["result"]["content"][0]["text"], "{\"isValid\": false}");
        assert_eq!(body["result"]["structuredContent"], json!({"isValid": false}));
    }

    #[tokio::test]
    async fn test_protocol_rate_limit_is_too_many_requests() {
        let mut config = ServerConfig::default();
        config.rate_limit.surface = RateLimitSurface::ProtocolError;
        config
            .rate_limit
            .buckets
            .per_tool
            .insert("validate_address".to_string(), BucketConfig::new(1, 0.0));
        let app = router(&config);

        let first = app
            .clone()
            .oneshot(call("validate_address", json!({"address": ADDRESS})))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(call("validate_address", json!({"address": ADDRESS})))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json_body(second).await["error"]["code"], 429);
    }

    #[tokio::test]
    async fn test_tool_error_rate_limit_keeps_ok_status() {
        let mut config = ServerConfig::default();
        config
            .rate_limit
            .buckets
            .per_tool
            .insert("validate_address".to_string(), BucketConfig::new(0, 0.0));
        let app = router(&config);

        let response = app
            .oneshot(call("validate_address", json!({"address": ADDRESS})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["result"]["isError"], true);
        assert_eq!(
            body["result"]["content"][0]["text"],
            "Rate limit exceeded for tool 'validate_address'."
        );
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(&ServerConfig::default());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_metrics_count_requests_and_outcomes() {
        let state = Arc::new(AppState::new(&ServerConfig::default()).unwrap());
        let app = create_router(state.clone());

        app.clone()
            .oneshot(call("validate_address", json!({"address": ADDRESS})))
            .await
            .unwrap();
        app.clone()
            .oneshot(call("get_balance", json!({"address": "bad"})))
            .await
            .unwrap();

        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;

        assert_eq!(body["requests"], 3);
        assert_eq!(body["tool_success"]["validate_address"], 1);
        assert_eq!(body["tool_error"]["get_balance"], 1);
        assert_eq!(body["rate_limited"], 0);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(None), StatusCode::OK);
        assert_eq!(status_for(Some(-32700)), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(Some(-32600)), StatusCode::OK);
        assert_eq!(status_for(Some(-32602)), StatusCode::OK);
        assert_eq!(status_for(Some(429)), StatusCode::TOO_MANY_REQUESTS);
    }
}
