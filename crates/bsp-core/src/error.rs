// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for the BSP engine.

use thiserror::Error;

use crate::ident::{NodeId, WorkerId};

/// Errors emitted by the engine.
///
/// Configuration and unknown-node errors are raised eagerly, before any
/// worker thread starts. Synchronization errors abort the whole run; the
/// superstep in flight is discarded and no partial knowledge is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BspError {
    /// Worker count, iteration count, or graph/source combination is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// A source id or neighbor id is not a key of the graph.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    /// A barrier generation could not complete (deadline, abort, poisoned lock).
    #[error("broken barrier: {0}")]
    BrokenBarrier(String),
    /// A worker thread panicked during the run.
    #[error("worker {0} panicked")]
    WorkerPanicked(WorkerId),
}

impl BspError {
    /// Returns `true` for failures raised while workers were running.
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::BrokenBarrier(_) | Self::WorkerPanicked(_))
    }
}
