//! Majority grouping over decoded worker responses.
//!
//! Responses are grouped by canonical digest, so agreement is judged on
//! JSON structure rather than raw bytes. The leader is tracked
//! incrementally as replies stream in: a class takes the lead only by
//! strictly exceeding the current leader's count, which means the first
//! class to reach any given count keeps the lead on ties.

use ahash::RandomState;
use bytes::Bytes;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};

use crate::utils::digest_json_for_equality;

/// One equivalence class of structurally identical responses.
#[derive(Debug, Clone)]
pub struct ResponseClass {
    /// Raw bytes of the first response observed for this class.
    pub body: Bytes,
    /// How many workers produced this response.
    pub count: usize,
    /// Which workers produced it.
    pub workers: Vec<Arc<str>>,
}

/// Incremental majority count over decoded responses.
#[derive(Debug, Default)]
pub struct MajorityBallot {
    classes: HashMap<String, ResponseClass, RandomState>,
    leader: Option<String>,
}

impl MajorityBallot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one decoded response from `worker`.
    pub fn observe(&mut self, value: &Value, body: &Bytes, worker: &Arc<str>) {
        let digest = digest_json_for_equality(value);

        let count = self
            .classes
            .entry(digest.clone())
            .and_modify(|class| {
                class.count += 1;
                class.workers.push(Arc::clone(worker));
            })
            .or_insert_with(|| ResponseClass {
                body: body.clone(),
                count: 1,
                workers: vec![Arc::clone(worker)],
            })
            .count;

        let leader_count = self
            .leader
            .as_ref()
            .and_then(|leading| self.classes.get(leading))
            .map_or(0, |class| class.count);
        if count > leader_count {
            self.leader = Some(digest);
        }
    }

    /// Returns the winning class, if any response has been observed.
    #[must_use]
    pub fn leader(&self) -> Option<&ResponseClass> {
        self.leader.as_ref().and_then(|digest| self.classes.get(digest))
    }

    /// Returns how many distinct response classes were observed.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Returns the total number of responses observed.
    #[must_use]
    pub fn total_votes(&self) -> usize {
        self.classes.values().map(|class| class.count).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns the workers whose responses fall outside the leading class.
    #[must_use]
    pub fn disagreeing_workers(&self) -> Vec<Arc<str>> {
        let Some(leading) = self.leader.as_deref() else {
            return Vec::new();
        };

        self.classes
            .iter()
            .filter(|(digest, _)| digest.as_str() != leading)
            .flat_map(|(_, class)| class.workers.iter().map(Arc::clone))
            .collect()
    }
}
