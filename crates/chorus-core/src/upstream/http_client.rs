//! Shared HTTP client for worker calls.

use bytes::Bytes;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::upstream::errors::WorkerCallError;

/// HTTP client shared by every worker call.
///
/// One request means exactly one POST; there are no retries, because
/// dispatch treats a failed worker as a vote that never arrived and moves
/// on. The 45 second cap bounds calls that outlive their request's
/// deadline, since abandoned calls keep running in the background.
pub struct WorkerClient {
    client: Client,
}

impl WorkerClient {
    /// Creates the shared client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, WorkerCallError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(100)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(45))
            .http2_adaptive_window(true)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent("chorus/0.1.0")
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                WorkerCallError::Build(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self { client })
    }

    /// POSTs `body` to `uri` and returns the raw response bytes.
    ///
    /// The HTTP status is deliberately not inspected. Workers deliver
    /// JSON-RPC error envelopes with whatever status they like, and those
    /// bodies still count as responses.
    ///
    /// # Errors
    ///
    /// Returns a sanitized [`WorkerCallError`] when the request cannot be
    /// sent or the body cannot be read.
    pub async fn post(&self, uri: &str, body: Bytes) -> Result<Bytes, WorkerCallError> {
        let response = self
            .client
            .post(uri)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| WorkerCallError::from_reqwest(&e))?;

        response.bytes().await.map_err(|e| WorkerCallError::from_reqwest(&e))
    }
}
