//! Mock JSON-RPC Worker
//!
//! Wraps mockito to stub per-method worker responses with call-count
//! expectations, so tests can verify how often the proxy actually reached
//! the network.

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

/// A mock upstream worker backed by a mockito server.
///
/// Stubs are matched on the `method` member of the posted body, so one worker
/// can answer several methods differently. Every stub carries an expected hit
/// count checked by [`MockWorker::assert_all`].
pub struct MockWorker {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl MockWorker {
    /// Starts a new mock worker on a random loopback port.
    pub async fn start() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    /// Returns the worker URI to put into the proxy configuration.
    #[must_use]
    pub fn uri(&self) -> String {
        self.server.url()
    }

    /// Stubs a method with a successful result payload.
    pub fn stub_result(&mut self, method: &str, result: &Value, hits: usize) -> &mut Self {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result
        })
        .to_string();
        self.stub_raw(method, &body, hits)
    }

    /// Stubs a method with a JSON-RPC error envelope.
    pub fn stub_error(&mut self, method: &str, code: i32, message: &str, hits: usize) -> &mut Self {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": code,
                "message": message
            }
        })
        .to_string();
        self.stub_raw(method, &body, hits)
    }

    /// Stubs a method with a verbatim response body.
    pub fn stub_raw(&mut self, method: &str, body: &str, hits: usize) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(Matcher::Regex(format!(r#""method"\s*:\s*"{method}""#)))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Stubs a method with a body that does not parse as JSON.
    pub fn stub_garbage(&mut self, method: &str, hits: usize) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(Matcher::Regex(format!(r#""method"\s*:\s*"{method}""#)))
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("this is not json")
            .expect(hits)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Panics unless every stub was hit exactly its expected number of times.
    pub fn assert_all(&self) {
        for mock in &self.mocks {
            mock.assert();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_worker_starts_on_loopback() {
        let worker = MockWorker::start().await;
        assert!(worker.uri().starts_with("http://127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_stub_bodies_are_shaped_like_envelopes() {
        let mut worker = MockWorker::start().await;
        worker.stub_result("hello", &json!("world"), 0);
        worker.stub_error("broken", -32000, "backend busy", 0);

        // no requests sent, so zero-hit expectations hold
        worker.assert_all();
    }
}
