//! Response caching for worker calls.
//!
//! Cached response bodies are keyed by worker URI and raw request body, so
//! each worker keeps its own view of a given request even when workers
//! disagree. Entries carry an absolute expiry instant; reads treat expired
//! entries as absent and a periodic sweeper removes them for real.

use ahash::RandomState;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{Duration, Instant},
};
use tracing::{debug, info};

/// How long cached responses live unless a caller overrides it.
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(300);

/// How often the background sweeper evicts expired entries.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Builds the cache key for one worker and one raw request body.
///
/// Worker URIs are validated at config load to never contain `'^'`, so keys
/// from different workers cannot collide.
#[must_use]
pub fn cache_key(worker_uri: &str, body: &[u8]) -> String {
    format!("{}^{}", worker_uri, String::from_utf8_lossy(body))
}

/// Decides which methods may be answered from cache.
///
/// Derived from the config surface: `cache_all` wins over everything, and
/// the blacklist makes caching opt-out rather than opt-in. A whitelist field
/// exists in the config but is not consulted here.
#[derive(Debug, Clone, Default)]
pub struct CachePolicy {
    /// Cache every method regardless of the lists below.
    pub cache_all: bool,
    /// Cache any method that does not appear in `blacklist`.
    pub blacklist_enabled: bool,
    /// Methods excluded from caching when `blacklist_enabled` is set.
    pub blacklist: Vec<String>,
}

impl CachePolicy {
    /// Returns whether responses for `method` may be served from cache.
    #[must_use]
    pub fn is_cacheable(&self, method: &str) -> bool {
        if self.cache_all {
            return true;
        }
        self.blacklist_enabled && !self.blacklist.iter().any(|listed| listed == method)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: Bytes,
    /// `None` means the entry never expires.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Concurrent TTL cache for raw worker response bodies.
///
/// Lookups never remove entries, even expired ones. Eviction is the
/// sweeper's job so the read path stays contention-free.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry, RandomState>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_RESPONSE_TTL)
    }

    #[must_use]
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::with_hasher(RandomState::new()),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Stores `body` under `key` with the cache-wide default TTL.
    pub fn insert(&self, key: String, body: Bytes) {
        self.insert_with_ttl(key, body, self.default_ttl);
    }

    /// Stores `body` under `key`, expiring after `ttl`.
    pub fn insert_with_ttl(&self, key: String, body: Bytes, ttl: Duration) {
        let entry = CacheEntry { body, expires_at: Some(Instant::now() + ttl) };
        self.entries.insert(key, entry);
    }

    /// Stores `body` under `key` without an expiry.
    pub fn insert_no_expiry(&self, key: String, body: Bytes) {
        self.entries.insert(key, CacheEntry { body, expires_at: None });
    }

    /// Returns the cached body for `key` if present and not expired.
    ///
    /// An expired entry counts as a miss but is left for the sweeper.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.body.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns the current hit count.
    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the current miss count.
    #[must_use]
    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the periodic sweeper that evicts expired entries.
///
/// Runs until the shutdown signal arrives.
pub fn spawn_sweeper(
    cache: Arc<ResponseCache>,
    sweep_interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);

        loop {
            tokio::select! {
                biased; // Prioritize shutdown signal

                _ = shutdown_rx.recv() => {
                    debug!("cache sweeper received shutdown signal");
                    break;
                }

                _ = interval.tick() => {
                    let removed = cache.purge_expired();
                    if removed > 0 {
                        info!(removed, remaining = cache.len(), "swept expired cache entries");
                    }
                }
            }
        }
    })
}
