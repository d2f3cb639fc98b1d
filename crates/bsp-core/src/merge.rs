// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single-writer merge of the publish buffer into authoritative knowledge.
//!
//! # Algorithm
//!
//! 1. Take the knowledge write lock, then the buffer lock (fixed order).
//! 2. For every node in knowledge, mark it known if the buffer holds `true`.
//! 3. Clear the buffer.
//!
//! Steps 2 and 3 run inside one critical section with nothing fallible in
//! between, so no observer can see a half-applied merge or a buffer that was
//! merged but not cleared.

use serde::Serialize;

use crate::error::BspError;
use crate::ident::{NodeId, WorkerId};
use crate::state::SharedState;

/// Decides which worker runs the merge.
///
/// Static for the whole run. Every caller goes through
/// [`Election::is_elected`], so a rotating or failure-aware policy only has
/// to change this type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Election {
    coordinator: WorkerId,
}

impl Election {
    /// Elects `coordinator` for every superstep.
    pub const fn fixed(coordinator: WorkerId) -> Self {
        Self { coordinator }
    }

    /// The elected worker.
    pub fn coordinator(&self) -> WorkerId {
        self.coordinator
    }

    /// Whether `worker` performs the merge.
    pub fn is_elected(&self, worker: WorkerId) -> bool {
        worker == self.coordinator
    }
}

/// What one merge did. The driver keeps one record per superstep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SuperstepRecord {
    /// Zero-based superstep index.
    pub superstep: u64,
    /// Buffer entries observed by the merge.
    pub pending_at_merge: usize,
    /// Nodes that went from unknown to known, ascending.
    pub newly_informed: Vec<NodeId>,
    /// Number of known nodes after the merge.
    pub known_count: usize,
    /// Buffer size once the merge released its locks. This is the buffer
    /// the next compute phase starts from.
    pub pending_after_clear: usize,
}

/// Folds the publish buffer into knowledge and clears it, atomically.
///
/// Must only be called by the elected worker, between the compute barrier
/// and the post-merge barrier.
///
/// # Errors
///
/// Returns [`BspError::BrokenBarrier`] if either lock is poisoned. Nothing is
/// modified in that case.
pub fn merge_pending(state: &SharedState, superstep: u64) -> Result<SuperstepRecord, BspError> {
    let mut knowledge = state.knowledge.write()?;
    let mut pending = state.pending.lock()?;

    let pending_at_merge = pending.len();
    let mut newly_informed = Vec::new();
    for (id, known) in knowledge.iter_mut() {
        if !*known && pending.get(id).copied().unwrap_or(false) {
            *known = true;
            newly_informed.push(id.clone());
        }
    }
    pending.clear();

    Ok(SuperstepRecord {
        superstep,
        pending_at_merge,
        newly_informed,
        known_count: knowledge.values().filter(|known| **known).count(),
        pending_after_clear: pending.len(),
    })
}
