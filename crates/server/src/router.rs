//! HTTP entry point for JSON-RPC traffic.
//!
//! One catch-all handler serves every path: the proxy answers POST anywhere
//! and turns non-POST traffic into a parse-error envelope. Responses always
//! use HTTP 200 with a JSON body; JSON-RPC errors never ride on transport
//! status codes.

use axum::{
    extract::rejection::BytesRejection,
    http::{Method, StatusCode},
    response::IntoResponse,
    Router,
};
use bytes::Bytes;
use chorus_core::{
    proxy::ProxyEngine,
    types::{JsonRpcResponse, DEFAULT_REQUEST_ID, INVALID_REQUEST_CODE, PARSE_ERROR_CODE},
};
use serde_json::Value;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, warn};

use crate::middleware;

/// Upper bound on concurrently processed requests.
const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Request bodies above this size are refused before processing starts.
const MAX_BODY_BYTES: usize = 1024 * 1024;

type RpcResponse = (StatusCode, [(&'static str, &'static str); 1], Bytes);

/// Handles one JSON-RPC request.
///
/// The method check happens here rather than in the route table so that
/// non-POST traffic gets a JSON-RPC envelope instead of a bare 405.
pub async fn handle_rpc(
    method: Method,
    axum::extract::State(engine): axum::extract::State<Arc<ProxyEngine>>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    if method != Method::POST {
        debug!(%method, "rejecting non-POST request");
        return envelope(PARSE_ERROR_CODE, "only support POST JSON-RPC now");
    }

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "failed to read request body");
            return envelope(INVALID_REQUEST_CODE, "failed to read request body");
        }
    };

    json_response(engine.handle_request(body).await)
}

fn envelope(code: i32, message: &str) -> RpcResponse {
    let id = Arc::new(Value::from(DEFAULT_REQUEST_ID));
    json_response(JsonRpcResponse::error(code, message.to_string(), id).to_bytes())
}

fn json_response(body: Bytes) -> RpcResponse {
    (StatusCode::OK, [("content-type", "application/json")], body)
}

/// Builds the application router.
///
/// The JSON-RPC handler is installed as a fallback so it catches every path
/// and method; concurrency, body-size, and request-id layers wrap it.
#[must_use]
pub fn create_app(engine: Arc<ProxyEngine>) -> Router {
    let (set_request_id, propagate_request_id) = middleware::create_request_id_layers();

    Router::new()
        .fallback(handle_rpc)
        .with_state(engine)
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        // Layers are applied in reverse order, so propagate runs after set
        .layer(propagate_request_id)
        .layer(set_request_id)
}
