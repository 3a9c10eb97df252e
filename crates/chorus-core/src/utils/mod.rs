//! Utility functions shared across the proxy core.
//!
//! ## JSON Digesting (`json_digest`)
//! - Canonical string encoding of JSON values
//! - Used as the equality key for grouping worker responses
//! - Sorted object keys make the digest independent of member order

pub mod json_digest;

pub use json_digest::{digest_json_for_equality, json_values_equal};
