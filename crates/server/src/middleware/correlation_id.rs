//! Request correlation ID middleware.
//!
//! Every request gets an `x-request-id` header, generated when the client did
//! not send one and echoed back on the response. Log lines from different
//! workers handling the same inbound request can then be tied together.

use axum::http::{header::HeaderValue, HeaderName, Request};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

/// The header name for request correlation IDs.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// UUID v4 generator for request IDs, plugged into tower-http's request ID
/// middleware.
#[derive(Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).ok()?))
    }
}

/// Creates the request ID layer pair for the router.
///
/// The set layer assigns an `x-request-id` when missing; the propagate layer
/// copies it onto the response. Layers apply in reverse order, so install the
/// propagate layer first.
#[must_use]
pub fn create_request_id_layers() -> (SetRequestIdLayer<UuidRequestId>, PropagateRequestIdLayer) {
    let set_layer = SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestId);
    let propagate_layer = PropagateRequestIdLayer::new(X_REQUEST_ID.clone());

    (set_layer, propagate_layer)
}
