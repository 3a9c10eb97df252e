//! Worker invocation with read-through response caching.
//!
//! Every dispatch strategy funnels through [`WorkerInvoker::call`], which
//! wraps one worker call in the cache lookup and store rules. The outcome
//! keeps raw bytes and decoded value side by side so response selection can
//! compare values while answering clients with the original bytes.

use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    cache::{cache_key, CachePolicy, ResponseCache},
    types::is_success_response,
    upstream::{errors::WorkerCallError, http_client::WorkerClient, selection::WorkerTarget},
};

/// What one worker call produced.
#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    /// The HTTP exchange failed; no bytes were obtained.
    Failed(WorkerCallError),
    /// Bytes arrived but did not parse as JSON.
    Undecodable { body: Bytes },
    /// Bytes arrived and parsed.
    Decoded { body: Bytes, value: Value },
}

/// One worker's answer to one request.
#[derive(Debug, Clone)]
pub struct WorkerReply {
    /// Position of the worker in the configured list.
    pub worker_index: usize,
    pub worker_uri: Arc<str>,
    pub outcome: WorkerOutcome,
}

impl WorkerReply {
    /// Returns the decoded value when the reply parsed and is not JSON null.
    ///
    /// A bare `null` is a reply without an answer and never satisfies a
    /// request. Error envelopes decode to objects and do.
    #[must_use]
    pub fn valid_value(&self) -> Option<&Value> {
        match &self.outcome {
            WorkerOutcome::Decoded { value, .. } if !value.is_null() => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid_value().is_some()
    }

    /// Returns the raw bytes when the reply decoded to JSON.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        match &self.outcome {
            WorkerOutcome::Decoded { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Calls workers, consulting the response cache around each call.
pub struct WorkerInvoker {
    http: WorkerClient,
    cache: Arc<ResponseCache>,
    policy: CachePolicy,
}

impl WorkerInvoker {
    #[must_use]
    pub fn new(http: WorkerClient, cache: Arc<ResponseCache>, policy: CachePolicy) -> Self {
        Self { http, cache, policy }
    }

    /// Returns whether `method` may be served from and stored to cache.
    #[must_use]
    pub fn is_cacheable(&self, method: &str) -> bool {
        self.policy.is_cacheable(method)
    }

    /// Calls `target` with `body`, going through the cache when allowed.
    ///
    /// A cached body that no longer parses is ignored and the worker is
    /// called again. Fresh responses are stored when the method is cacheable
    /// or the decoded value carries no error member, so a fanout can warm
    /// the cache opportunistically even for uncacheable methods.
    pub async fn call(&self, target: &WorkerTarget, body: &Bytes, cacheable: bool) -> WorkerReply {
        let key = cache_key(&target.uri, body);

        if cacheable {
            if let Some(cached) = self.cache.get(&key) {
                match serde_json::from_slice::<Value>(&cached) {
                    Ok(value) => {
                        debug!(worker = %target.uri, "serving worker response from cache");
                        return WorkerReply {
                            worker_index: target.index,
                            worker_uri: Arc::clone(&target.uri),
                            outcome: WorkerOutcome::Decoded { body: cached, value },
                        };
                    }
                    Err(error) => {
                        warn!(
                            worker = %target.uri,
                            error = %error,
                            "cached response does not parse, calling worker again"
                        );
                    }
                }
            }
        }

        let outcome = match self.http.post(&target.uri, body.clone()).await {
            Ok(raw) => match serde_json::from_slice::<Value>(&raw) {
                Ok(value) => {
                    if cacheable || is_success_response(&value) {
                        self.cache.insert(key, raw.clone());
                    }
                    WorkerOutcome::Decoded { body: raw, value }
                }
                Err(error) => {
                    warn!(worker = %target.uri, error = %error, "worker response is not JSON");
                    WorkerOutcome::Undecodable { body: raw }
                }
            },
            Err(error) => {
                warn!(worker = %target.uri, error = %error, "worker call failed");
                WorkerOutcome::Failed(error)
            }
        };

        WorkerReply { worker_index: target.index, worker_uri: Arc::clone(&target.uri), outcome }
    }
}
