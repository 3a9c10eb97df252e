//! Mock Infrastructure for Proxy Testing
//!
//! This module provides reusable mock types for testing worker interactions
//! without requiring real upstream services.
//!
//! ## Components
//!
//! - `MockWorker`: wraps mockito for per-method JSON-RPC response stubbing
//!   with call-count expectations
//! - `ScriptedWorker` / `SilentWorker`: loopback HTTP servers for
//!   timing-sensitive dispatch tests (delays, never-answering workers)
//! - Request builders for well-formed JSON-RPC bodies
//!
//! ## Usage
//!
//! ```ignore
//! use tests::mock_infrastructure::{request_bytes, MockWorker};
//!
//! let mut worker = MockWorker::start().await;
//! worker.stub_result("hello", &serde_json::json!("world"), 1);
//!
//! // Point the proxy at worker.uri() and send request_bytes("hello", 1)
//! ```

pub mod rpc_mock;

pub use rpc_mock::MockWorker;
pub use test_helpers::*;
