//! HTTP surface integration tests.
//!
//! Requests are driven through the assembled router with tower's `oneshot`,
//! so the full middleware stack runs without binding a listener. Upstream
//! workers are real mockito servers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use chorus_core::cache::ResponseCache;
use chorus_core::config::AppConfig;
use chorus_core::proxy::ProxyEngine;
use serde_json::{json, Value};
use server::router::create_app;
use tower::ServiceExt;

use crate::mock_infrastructure::{request_bytes, MockWorker};

fn create_app_for(workers: Vec<String>) -> Router {
    let mut config = AppConfig::default();
    config.workers = workers;
    config.request_timeout_seconds = 5;

    let engine = ProxyEngine::from_config(&config, Arc::new(ResponseCache::new()))
        .expect("engine builds");
    create_app(Arc::new(engine))
}

async fn send(app: Router, method: &str, path: &str, body: impl Into<Body>) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(body.into())
        .expect("request builds");

    app.oneshot(request).await.expect("router is infallible")
}

async fn body_to_json(response: Response) -> Value {
    let bytes =
        axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

#[tokio::test]
async fn test_post_round_trip_forwards_worker_reply() {
    let mut worker = MockWorker::start().await;
    worker.stub_result("hello", &json!("pong"), 1);
    let app = create_app_for(vec![worker.uri()]);

    let response = send(app, "POST", "/", request_bytes("hello", 1)).await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    let envelope = body_to_json(response).await;
    assert_eq!(envelope["result"], "pong");
    worker.assert_all();
}

#[tokio::test]
async fn test_non_post_method_rejected_with_parse_error() {
    let app = create_app_for(vec!["http://127.0.0.1:1".to_string()]);

    let response = send(app, "GET", "/", Body::empty()).await;

    assert_eq!(response.status(), 200);
    let envelope = body_to_json(response).await;
    assert_eq!(envelope["error"]["code"], -32700);
    assert_eq!(envelope["error"]["message"], "only support POST JSON-RPC now");
    assert_eq!(envelope["id"], 1);
}

#[tokio::test]
async fn test_missing_method_yields_invalid_request_with_original_id() {
    let app = create_app_for(vec!["http://127.0.0.1:1".to_string()]);

    let response = send(app, "POST", "/", r#"{"id":7,"params":[]}"#).await;

    assert_eq!(response.status(), 200);
    let envelope = body_to_json(response).await;
    assert_eq!(envelope["error"]["code"], -32600);
    assert_eq!(envelope["id"], 7);
}

#[tokio::test]
async fn test_unparseable_body_yields_invalid_request() {
    let app = create_app_for(vec!["http://127.0.0.1:1".to_string()]);

    let response = send(app, "POST", "/", "this is not json").await;

    assert_eq!(response.status(), 200);
    let envelope = body_to_json(response).await;
    assert_eq!(envelope["error"]["code"], -32600);
    assert_eq!(envelope["error"]["message"], "request body is not valid JSON");
    assert_eq!(envelope["id"], 1);
}

#[tokio::test]
async fn test_worker_error_envelope_passes_through_with_status_ok() {
    let mut worker = MockWorker::start().await;
    worker.stub_error("hello", -32000, "backend busy", 1);
    let app = create_app_for(vec![worker.uri()]);

    let response = send(app, "POST", "/", request_bytes("hello", 1)).await;

    assert_eq!(response.status(), 200);
    let envelope = body_to_json(response).await;
    assert_eq!(envelope["error"]["code"], -32000);
    worker.assert_all();
}

#[tokio::test]
async fn test_any_path_reaches_the_proxy() {
    let mut worker = MockWorker::start().await;
    worker.stub_result("hello", &json!("anywhere"), 1);
    let app = create_app_for(vec![worker.uri()]);

    let response = send(app, "POST", "/v1/rpc/region/eu", request_bytes("hello", 1)).await;

    assert_eq!(response.status(), 200);
    let envelope = body_to_json(response).await;
    assert_eq!(envelope["result"], "anywhere");
    worker.assert_all();
}
