// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Round-robin node partitioning.
//!
//! # Routing Rule
//!
//! ```text
//! owner(node) = rank(node) mod k
//! ```
//!
//! where `rank` is the node's position in the lexicographically sorted node
//! set. The assignment is computed once per run and never mutated.

use crate::error::BspError;
use crate::ident::{NodeId, WorkerId};

/// The node subset owned by one worker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    /// Owning worker.
    pub worker: WorkerId,
    /// Owned nodes, in rank order.
    pub nodes: Vec<NodeId>,
}

/// Returns the worker that owns the node at sorted position `rank`.
#[inline]
pub fn owner_of(rank: usize, workers: usize) -> WorkerId {
    WorkerId(rank % workers)
}

/// Partitions `nodes` among `workers` by rank.
///
/// `nodes` must already be in the deterministic rank order (see
/// [`crate::Graph::nodes`]). Returns exactly `workers` partitions, indexed by
/// worker id; trailing partitions are empty when `workers > nodes.len()`.
///
/// # Errors
///
/// Returns [`BspError::InvalidConfig`] if `workers == 0`.
pub fn partition_round_robin(
    nodes: &[NodeId],
    workers: usize,
) -> Result<Vec<Partition>, BspError> {
    if workers == 0 {
        return Err(BspError::InvalidConfig(
            "worker count must be >= 1".to_owned(),
        ));
    }

    let mut parts: Vec<Partition> = (0..workers)
        .map(|w| Partition {
            worker: WorkerId(w),
            nodes: Vec::new(),
        })
        .collect();

    for (rank, node) in nodes.iter().enumerate() {
        parts[owner_of(rank, workers).index()].nodes.push(node.clone());
    }

    Ok(parts)
}
