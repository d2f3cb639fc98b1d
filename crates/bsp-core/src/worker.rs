// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Diffusion worker: owns one partition and runs the superstep loop.
//!
//! # Superstep Protocol
//!
//! ```text
//! Computing -> AwaitComputeBarrier -> [AwaitMergeBarrier] -> Merging (elected only)
//!           -> AwaitPostMergeBarrier -> Computing | Done
//! ```
//!
//! `AwaitMergeBarrier` is only issued under [`BarrierProtocol::ThreePhase`].
//! Workers never write knowledge; they publish into the pending buffer and
//! the elected worker merges.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Mutex;

use tracing::{debug, trace};

use crate::barrier::PhaseBarrier;
use crate::config::BarrierProtocol;
use crate::error::BspError;
use crate::graph::Graph;
use crate::ident::{NodeId, WorkerId};
use crate::merge::{merge_pending, Election, SuperstepRecord};
use crate::partition::Partition;
use crate::state::{Knowledge, SharedState};

/// Per-superstep phase, as seen by one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Reading knowledge, publishing local spread.
    Computing,
    /// Waiting for every worker to finish compute.
    AwaitComputeBarrier,
    /// Waiting at the rendezvous that opens the merge window.
    AwaitMergeBarrier,
    /// Elected worker folding the buffer into knowledge.
    Merging,
    /// Waiting for the merge to become visible to everyone.
    AwaitPostMergeBarrier,
    /// All supersteps finished.
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Computing => "computing",
            Self::AwaitComputeBarrier => "await-compute-barrier",
            Self::AwaitMergeBarrier => "await-merge-barrier",
            Self::Merging => "merging",
            Self::AwaitPostMergeBarrier => "await-post-merge-barrier",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Handles shared by every worker of one run.
#[derive(Clone, Copy, Debug)]
pub struct WorkerContext<'a> {
    /// Read-only graph.
    pub graph: &'a Graph,
    /// Knowledge and pending buffer.
    pub state: &'a SharedState,
    /// Rendezvous shared by all workers.
    pub barrier: &'a PhaseBarrier,
    /// Barrier generations per superstep.
    pub protocol: BarrierProtocol,
    /// Merge election.
    pub election: Election,
    /// Per-superstep merge records; appended by the elected worker only.
    pub history: &'a Mutex<Vec<SuperstepRecord>>,
}

/// Neighbors reachable from any owned node currently marked known.
///
/// `knowledge` is the previous superstep's final state; this function does
/// not look at the pending buffer.
pub fn compute_local_spread(
    graph: &Graph,
    owned: &[NodeId],
    knowledge: &Knowledge,
) -> BTreeSet<NodeId> {
    owned
        .iter()
        .filter(|node| knowledge.get(*node).copied().unwrap_or(false))
        .flat_map(|node| graph.neighbors(node).iter().cloned())
        .collect()
}

/// Breaks the barrier if the owning thread unwinds, so peers fail fast
/// instead of waiting for a participant that will never arrive.
struct AbortOnPanic<'a> {
    barrier: &'a PhaseBarrier,
    worker: WorkerId,
}

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.barrier
                .abort(format!("worker {} panicked", self.worker));
        }
    }
}

/// Runs the superstep loop for one partition.
#[derive(Clone, Debug)]
pub struct DiffusionWorker {
    partition: Partition,
}

impl DiffusionWorker {
    /// Creates a worker owning `partition`.
    pub fn new(partition: Partition) -> Self {
        Self { partition }
    }

    /// This worker's id.
    pub fn id(&self) -> WorkerId {
        self.partition.worker
    }

    /// Owned nodes, in rank order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.partition.nodes
    }

    /// Runs `iters` supersteps.
    ///
    /// On failure the barrier is broken before returning so that no peer is
    /// left blocked.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::BrokenBarrier`] if any barrier generation fails or
    /// a shared lock is poisoned.
    pub fn run(&self, ctx: &WorkerContext<'_>, iters: usize) -> Result<(), BspError> {
        let _abort = AbortOnPanic {
            barrier: ctx.barrier,
            worker: self.id(),
        };

        for superstep in 0..iters as u64 {
            if let Err(err) = self.superstep(ctx, superstep) {
                ctx.barrier
                    .abort(format!("worker {} failed in superstep {superstep}: {err}", self.id()));
                return Err(err);
            }
        }

        trace!(worker = %self.id(), phase = %Phase::Done, "worker finished");
        Ok(())
    }

    fn superstep(&self, ctx: &WorkerContext<'_>, superstep: u64) -> Result<(), BspError> {
        let worker = self.id();

        trace!(%worker, superstep, phase = %Phase::Computing);
        // Read guard is dropped before publishing; workers never hold both locks.
        let spread = {
            let knowledge = ctx.state.knowledge.read()?;
            compute_local_spread(ctx.graph, self.nodes(), &knowledge)
        };
        let published = spread.len();
        ctx.state.pending.publish(spread)?;

        trace!(%worker, superstep, published, phase = %Phase::AwaitComputeBarrier);
        ctx.barrier.wait()?;

        if ctx.protocol.has_merge_window() {
            trace!(%worker, superstep, phase = %Phase::AwaitMergeBarrier);
            ctx.barrier.wait()?;
        }

        if ctx.election.is_elected(worker) {
            trace!(%worker, superstep, phase = %Phase::Merging);
            let record = merge_pending(ctx.state, superstep)?;
            debug!(
                superstep,
                newly_informed = record.newly_informed.len(),
                known = record.known_count,
                "merged superstep"
            );
            ctx.history
                .lock()
                .map_err(|_| BspError::BrokenBarrier("history lock poisoned".to_owned()))?
                .push(record);
        }

        trace!(%worker, superstep, phase = %Phase::AwaitPostMergeBarrier);
        ctx.barrier.wait()?;
        Ok(())
    }
}
