//! Worker selection modes and the rotation cursor.
//!
//! All strategies share one process-wide cursor, so consecutive requests
//! rotate through the worker list no matter which mode is active.

use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// How the proxy chooses which workers see a request.
///
/// Fixed for the lifetime of the process. Unknown names are rejected when
/// the config is deserialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Fan out to every worker and answer with the first valid response.
    #[serde(rename = "fist_of_all")]
    FanoutFirst,
    /// Fan out to every worker and answer with the majority response.
    #[serde(rename = "most_of_all")]
    FanoutVote,
    /// Try workers one at a time in rotated order until one answers validly.
    #[default]
    #[serde(rename = "only_first")]
    SequentialFallback,
    /// Send to exactly one worker chosen by rotation, with no fallback.
    #[serde(rename = "only_once")]
    SinglePick,
}

impl SelectionMode {
    /// Returns the config wire name for the mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FanoutFirst => "fist_of_all",
            Self::FanoutVote => "most_of_all",
            Self::SequentialFallback => "only_first",
            Self::SinglePick => "only_once",
        }
    }
}

/// One worker chosen for a dispatch.
#[derive(Debug, Clone)]
pub struct WorkerTarget {
    /// Position in the configured worker list.
    pub index: usize,
    pub uri: Arc<str>,
}

/// The configured workers plus the shared rotation cursor.
///
/// The worker list never changes after startup; only the cursor moves.
pub struct WorkerPool {
    workers: Vec<Arc<str>>,
    cursor: AtomicUsize,
}

impl WorkerPool {
    #[must_use]
    pub fn new(workers: &[String]) -> Self {
        Self {
            workers: workers.iter().map(|uri| Arc::from(uri.as_str())).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Returns every worker in configured order without moving the cursor.
    #[must_use]
    pub fn all(&self) -> Vec<WorkerTarget> {
        self.workers
            .iter()
            .enumerate()
            .map(|(index, uri)| WorkerTarget { index, uri: Arc::clone(uri) })
            .collect()
    }

    /// Returns every worker starting from the next rotation position.
    ///
    /// Advances the cursor, so consecutive calls start one worker later
    /// each time and wrap around the list.
    #[must_use]
    pub fn rotated(&self) -> Vec<WorkerTarget> {
        let count = self.workers.len();
        if count == 0 {
            return Vec::new();
        }

        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % count;
        (0..count)
            .map(|offset| {
                let index = (start + offset) % count;
                WorkerTarget { index, uri: Arc::clone(&self.workers[index]) }
            })
            .collect()
    }

    /// Returns the single worker at the next rotation position.
    #[must_use]
    pub fn pick_one(&self) -> Option<WorkerTarget> {
        let count = self.workers.len();
        if count == 0 {
            return None;
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % count;
        Some(WorkerTarget { index, uri: Arc::clone(&self.workers[index]) })
    }
}
