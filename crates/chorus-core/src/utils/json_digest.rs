//! Canonical JSON digesting for response equality.
//!
//! Workers that agree on a result may still serialize it differently: object
//! members can appear in any order, and whitespace varies by implementation.
//! The digest re-encodes a parsed value into one canonical string so that
//! semantically identical responses compare equal byte-for-byte.
//!
//! # Canonical Form
//!
//! - Object members are emitted in lexicographically sorted key order.
//! - Array elements keep their original order; `[1,2]` and `[2,1]` differ.
//! - Scalars use their compact JSON encoding (`null`, `true`, `"hi"`, `32`),
//!   so a JSON `null` and the string `"null"` stay distinct.

use serde_json::Value;
use std::fmt::Write;

/// Encodes a JSON value into its canonical digest string.
///
/// The digest is the equality key for consensus grouping: two values produce
/// the same digest iff they are the same JSON value modulo object member
/// order.
///
/// # Example
///
/// ```
/// use chorus_core::utils::digest_json_for_equality;
/// use serde_json::json;
///
/// let a = digest_json_for_equality(&json!({"b": 2, "a": 1}));
/// let b = digest_json_for_equality(&json!({"a": 1, "b": 2}));
/// assert_eq!(a, b);
/// assert_eq!(a, r#"{"a":1,"b":2}"#);
/// ```
#[must_use]
pub fn digest_json_for_equality(value: &Value) -> String {
    let mut out = String::with_capacity(128);
    write_digest(value, &mut out);
    out
}

/// Returns `true` when two JSON values have the same canonical digest.
#[must_use]
pub fn json_values_equal(a: &Value, b: &Value) -> bool {
    digest_json_for_equality(a) == digest_json_for_equality(b)
}

fn write_digest(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::String(s) => write_json_string(s, out),
        Value::Array(arr) => {
            out.push('[');
            for (idx, element) in arr.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_digest(element, out);
            }
            out.push(']');
        }
        Value::Object(obj) => {
            out.push('{');

            // Sorted keys make the digest independent of member order
            let mut sorted_keys: Vec<&String> = obj.keys().collect();
            sorted_keys.sort_unstable();

            for (idx, key) in sorted_keys.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_json_string(key, out);
                out.push(':');
                if let Some(member) = obj.get(key) {
                    write_digest(member, out);
                }
            }
            out.push('}');
        }
    }
}

/// Appends a JSON-escaped string literal to the digest buffer.
fn write_json_string(s: &str, out: &mut String) {
    match serde_json::to_string(s) {
        Ok(encoded) => out.push_str(&encoded),
        // serde_json cannot fail on a bare string; degrade rather than panic
        Err(_) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
    }
}
