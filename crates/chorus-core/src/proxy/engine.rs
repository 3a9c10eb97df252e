//! Core proxy engine: parses inbound bodies, dispatches worker calls
//! according to the selection mode, and picks the reply to return.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use serde_json::Value;
use tokio::{
    sync::mpsc,
    time::{timeout_at, Instant},
};
use tracing::{debug, warn};

use crate::{
    cache::ResponseCache,
    config::AppConfig,
    types::{
        JsonRpcResponse, RequestMeta, DEFAULT_REQUEST_ID, INTERNAL_ERROR_CODE, INVALID_REQUEST_CODE,
    },
    upstream::{
        MajorityBallot, SelectionMode, WorkerClient, WorkerInvoker, WorkerOutcome, WorkerPool,
        WorkerReply,
    },
};

use super::errors::ProxyError;

/// Request processing engine.
///
/// Owns the worker pool and the invoker (HTTP client plus response cache) and
/// implements the four dispatch strategies of [`SelectionMode`]. The engine is
/// cheap to share behind an `Arc` and every method takes `&self`.
pub struct ProxyEngine {
    invoker: Arc<WorkerInvoker>,
    pool: WorkerPool,
    mode: SelectionMode,
    request_timeout: Duration,
}

impl ProxyEngine {
    /// Creates a new proxy engine from already-built parts.
    #[must_use]
    pub fn new(
        invoker: Arc<WorkerInvoker>,
        pool: WorkerPool,
        mode: SelectionMode,
        request_timeout: Duration,
    ) -> Self {
        Self { invoker, pool, mode, request_timeout }
    }

    /// Builds an engine from configuration, wiring the HTTP client, response
    /// cache, and worker pool together.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidConfig`] when the configuration fails
    /// validation and [`ProxyError::Worker`] when the HTTP client cannot be
    /// built.
    pub fn from_config(config: &AppConfig, cache: Arc<ResponseCache>) -> Result<Self, ProxyError> {
        config.validate().map_err(ProxyError::InvalidConfig)?;

        let client = WorkerClient::new()?;
        let invoker = Arc::new(WorkerInvoker::new(client, cache, config.cache_policy()));
        let pool = WorkerPool::new(&config.workers);

        Ok(Self::new(invoker, pool, config.select_worker_mode, config.request_timeout()))
    }

    /// Processes one inbound request body and returns the response body.
    ///
    /// The returned bytes are always a complete JSON-RPC envelope: either a
    /// worker's reply forwarded verbatim or an error envelope built here.
    /// Malformed bodies never reach a worker.
    pub async fn handle_request(&self, body: Bytes) -> Bytes {
        let parsed: Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "request body is not valid JSON");
                return JsonRpcResponse::error(
                    INVALID_REQUEST_CODE,
                    "request body is not valid JSON".to_string(),
                    Arc::new(Value::from(DEFAULT_REQUEST_ID)),
                )
                .to_bytes();
            }
        };

        let meta = RequestMeta::from_value(&parsed);
        let Some(method) = meta.method else {
            warn!("request has no usable method field");
            return JsonRpcResponse::error(
                INVALID_REQUEST_CODE,
                "method field missing or not a string".to_string(),
                meta.id,
            )
            .to_bytes();
        };

        let cacheable = self.invoker.is_cacheable(&method);
        debug!(method, mode = self.mode.as_str(), cacheable, "dispatching request");

        self.dispatch(&method, meta.id, body, cacheable).await
    }

    /// Fans the raw body out to the selected workers and collects replies
    /// until one can be returned or the deadline passes.
    async fn dispatch(&self, method: &str, id: Arc<Value>, body: Bytes, cacheable: bool) -> Bytes {
        let targets = match self.mode {
            SelectionMode::FanoutFirst | SelectionMode::FanoutVote => self.pool.all(),
            SelectionMode::SequentialFallback => self.pool.rotated(),
            SelectionMode::SinglePick => self.pool.pick_one().into_iter().collect(),
        };
        if targets.is_empty() {
            warn!(method, "no workers available");
            return Self::no_responses(id);
        }

        // Sequential dispatch walks the whole rotated list inside one task but
        // delivers exactly one reply; the fanout modes deliver one per worker.
        let expected = match self.mode {
            SelectionMode::FanoutFirst | SelectionMode::FanoutVote => targets.len(),
            SelectionMode::SequentialFallback | SelectionMode::SinglePick => 1,
        };
        let deadline = Instant::now() + self.request_timeout;
        let (tx, mut rx) = mpsc::channel::<WorkerReply>(targets.len());

        match self.mode {
            SelectionMode::SequentialFallback => {
                let invoker = Arc::clone(&self.invoker);
                tokio::spawn(async move {
                    let last = targets.len() - 1;
                    for (position, target) in targets.into_iter().enumerate() {
                        let reply = invoker.call(&target, &body, cacheable).await;
                        // The terminal reply is delivered even when unusable
                        // so the collector always hears back.
                        if reply.is_valid() || position == last {
                            let _ = tx.send(reply).await;
                            break;
                        }
                        debug!(worker = %target.uri, "reply unusable, falling back to next worker");
                    }
                });
            }
            _ => {
                for target in targets {
                    let invoker = Arc::clone(&self.invoker);
                    let body = body.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(invoker.call(&target, &body, cacheable).await).await;
                    });
                }
                drop(tx);
            }
        }

        let mut ballot = MajorityBallot::new();
        let mut received = 0usize;

        while received < expected {
            let reply = match timeout_at(deadline, rx.recv()).await {
                Ok(Some(reply)) => reply,
                Ok(None) => {
                    debug!(received, expected, "reply channel closed early");
                    break;
                }
                Err(_) => {
                    warn!(
                        method,
                        received,
                        expected,
                        timeout_seconds = self.request_timeout.as_secs(),
                        "deadline reached while collecting worker replies"
                    );
                    break;
                }
            };
            received += 1;

            match &reply.outcome {
                WorkerOutcome::Decoded { body, value } if !value.is_null() => match self.mode {
                    SelectionMode::FanoutVote => ballot.observe(value, body, &reply.worker_uri),
                    _ => {
                        debug!(worker = %reply.worker_uri, "responding with first usable reply");
                        return body.clone();
                    }
                },
                _ => {
                    debug!(worker = %reply.worker_uri, "skipping reply without a usable JSON value");
                }
            }
        }

        if self.mode == SelectionMode::FanoutVote {
            if ballot.class_count() > 1 {
                warn!(
                    method,
                    classes = ballot.class_count(),
                    disagreeing = ?ballot.disagreeing_workers(),
                    "workers disagree on response content"
                );
            }
            if let Some(leader) = ballot.leader() {
                debug!(
                    votes = leader.count,
                    total = ballot.total_votes(),
                    "responding with majority reply"
                );
                return leader.body.clone();
            }
        }

        warn!(method, received, "no usable worker response before the deadline");
        Self::no_responses(id)
    }

    fn no_responses(id: Arc<Value>) -> Bytes {
        JsonRpcResponse::error(INTERNAL_ERROR_CODE, "no responses until timeout".to_string(), id)
            .to_bytes()
    }
}
