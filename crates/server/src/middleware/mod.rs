//! HTTP middleware components for the proxy server.

pub mod correlation_id;

pub use correlation_id::{create_request_id_layers, X_REQUEST_ID};
