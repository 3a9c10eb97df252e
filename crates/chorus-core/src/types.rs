//! JSON-RPC 2.0 envelope types and inbound request parsing.
//!
//! # Envelope Shapes
//!
//! - Success: `{"jsonrpc": "2.0", "id": ..., "result": ...}`
//! - Error: `{"jsonrpc": "2.0", "id": ..., "error": {"code", "message", "data"}}`
//!
//! The `data` member of an error object is always serialized, as `null` when
//! no detail is attached. Success envelopes never carry an `error` member and
//! error envelopes never carry a `result` member.
//!
//! # Id Extraction
//!
//! [`extract_request_id`] tries an integer-typed `id` first, then a
//! string-typed one, and falls back to the sentinel `1` for anything else
//! (absent, null, fractional, nested). Callers that could not parse the body
//! at all use the same sentinel.

use serde::{Deserialize, Serialize};
use std::{borrow::Cow, sync::Arc};

/// JSON-RPC protocol version constant to avoid repeated allocations.
pub const JSONRPC_VERSION: &str = "2.0";

/// Pre-allocated `Cow` for the JSON-RPC version, zero allocation for static usage.
pub const JSONRPC_VERSION_COW: Cow<'static, str> = Cow::Borrowed(JSONRPC_VERSION);

/// Parse error (`-32700`): the server received bytes it cannot treat as a request.
pub const PARSE_ERROR_CODE: i32 = -32700;
/// Invalid request (`-32600`): readable bytes but not a dispatchable JSON-RPC call.
pub const INVALID_REQUEST_CODE: i32 = -32600;
/// Method not found (`-32601`). Reserved, not produced by current logic.
pub const METHOD_NOT_FOUND_CODE: i32 = -32601;
/// Invalid params (`-32602`). Reserved, not produced by current logic.
pub const INVALID_PARAMS_CODE: i32 = -32602;
/// Internal error (`-32603`): no worker produced a usable response.
pub const INTERNAL_ERROR_CODE: i32 = -32603;

/// Sentinel request id used when the inbound body carries no usable `id`.
pub const DEFAULT_REQUEST_ID: i64 = 1;

/// JSON-RPC 2.0 request structure.
///
/// The proxy forwards inbound bodies verbatim, so this type is not on the
/// dispatch path; it exists for building well-formed requests in clients and
/// tests.
///
/// # Example
///
/// ```
/// use chorus_core::types::JsonRpcRequest;
/// use serde_json::json;
///
/// let request = JsonRpcRequest::new("get_balance", Some(json!(["acct1"])), json!(7));
/// assert_eq!(request.method, "get_balance");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Cow<'static, str>,
    pub method: String,
    pub params: Option<serde_json::Value>,
    pub id: Arc<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Creates a new JSON-RPC request with zero allocation for the version string.
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        params: Option<serde_json::Value>,
        id: serde_json::Value,
    ) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, method: method.into(), params, id: Arc::new(id) }
    }
}

/// JSON-RPC 2.0 response structure.
///
/// Exactly one of `result` and `error` is present; the absent one is omitted
/// from the serialized form entirely.
///
/// # Example
///
/// ```
/// use chorus_core::types::JsonRpcResponse;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let response = JsonRpcResponse::success(json!("0x1"), Arc::new(json!(1)));
/// assert!(response.result.is_some());
/// assert!(response.error.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Arc<serde_json::Value>,
}

impl JsonRpcResponse {
    /// Creates a successful JSON-RPC response with zero allocation for the version string.
    #[must_use]
    pub fn success(result: serde_json::Value, id: Arc<serde_json::Value>) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, result: Some(result), error: None, id }
    }

    /// Creates an error JSON-RPC response with zero allocation for the version string.
    #[must_use]
    pub fn error(code: i32, message: String, id: Arc<serde_json::Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION_COW,
            result: None,
            error: Some(JsonRpcError { code, message, data: None }),
            id,
        }
    }

    /// Serializes this envelope to bytes.
    ///
    /// Envelope structs contain only string keys and JSON values, so
    /// serialization is infallible in practice.
    #[must_use]
    pub fn to_bytes(&self) -> bytes::Bytes {
        bytes::Bytes::from(
            serde_json::to_vec(self).expect("JsonRpcResponse serialization cannot fail"),
        )
    }
}

/// JSON-RPC 2.0 error object.
///
/// `data` is serialized unconditionally so error envelopes always expose the
/// member, as `null` when nothing is attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// The fields the proxy needs from an inbound request before dispatch.
///
/// `method` is `None` when the member is absent or not a string, which the
/// engine treats as a hard parse error. `id` always holds a usable value,
/// falling back to [`DEFAULT_REQUEST_ID`].
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Option<String>,
    pub id: Arc<serde_json::Value>,
}

impl RequestMeta {
    /// Extracts method and id from a parsed request body.
    #[must_use]
    pub fn from_value(body: &serde_json::Value) -> Self {
        let method = body.get("method").and_then(serde_json::Value::as_str).map(String::from);
        Self { method, id: Arc::new(extract_request_id(body)) }
    }
}

/// Extracts the request `id`: integer first, then string, then the sentinel.
#[must_use]
pub fn extract_request_id(body: &serde_json::Value) -> serde_json::Value {
    match body.get("id") {
        Some(serde_json::Value::Number(n)) if n.is_i64() || n.is_u64() => {
            serde_json::Value::Number(n.clone())
        }
        Some(serde_json::Value::String(s)) => serde_json::Value::String(s.clone()),
        _ => serde_json::Value::from(DEFAULT_REQUEST_ID),
    }
}

/// Returns `true` when a parsed worker reply looks like a successful JSON-RPC
/// response, i.e. it carries no top-level `error` member.
#[must_use]
pub fn is_success_response(value: &serde_json::Value) -> bool {
    value.get("error").is_none()
}
