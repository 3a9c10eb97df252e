//! HTTP server library for the Chorus JSON-RPC fan-out proxy.
//!
//! The router and middleware live here rather than in the binary so
//! integration tests can drive the full HTTP surface without binding a
//! socket.

pub mod middleware;
pub mod router;
