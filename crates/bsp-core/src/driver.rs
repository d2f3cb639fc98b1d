// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Simulation driver: validates, partitions, spawns workers, joins.
//!
//! The driver performs no computation while workers run. It is the only
//! spawn site for worker threads.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::barrier::PhaseBarrier;
use crate::config::SimConfig;
use crate::error::BspError;
use crate::graph::Graph;
use crate::ident::{NodeId, WorkerId};
use crate::merge::{Election, SuperstepRecord};
use crate::partition::{partition_round_robin, Partition};
use crate::state::{known_nodes, Knowledge, SharedState};
use crate::worker::{DiffusionWorker, WorkerContext};

/// Result of a completed run.
#[derive(Clone, Debug, Serialize)]
pub struct SimOutcome {
    /// Final knowledge for every node.
    pub knowledge: Knowledge,
    /// Wall-clock time from first spawn to last join.
    #[serde(rename = "elapsed_seconds", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// One record per superstep, in order.
    pub history: Vec<SuperstepRecord>,
    /// Partition assignment used for the run.
    #[serde(skip)]
    pub partitions: Vec<Partition>,
}

impl SimOutcome {
    /// Elapsed wall-clock time in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Known nodes, ascending.
    pub fn known_nodes(&self) -> Vec<NodeId> {
        known_nodes(&self.knowledge)
    }

    /// First superstep after which knowledge stopped changing, if reached.
    pub fn fixed_point_at(&self) -> Option<u64> {
        self.history
            .iter()
            .find(|record| record.newly_informed.is_empty())
            .map(|record| record.superstep)
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// A configured simulation over one graph.
#[derive(Clone, Debug)]
pub struct Simulation<'g> {
    graph: &'g Graph,
    config: SimConfig,
    election: Election,
}

impl<'g> Simulation<'g> {
    /// Creates a simulation; nothing is validated until [`Simulation::run`].
    pub fn new(graph: &'g Graph, config: SimConfig) -> Self {
        Self {
            graph,
            config,
            election: Election::default(),
        }
    }

    /// Overrides the merge election (default: worker 0).
    pub fn with_election(mut self, election: Election) -> Self {
        self.election = election;
        self
    }

    /// The run configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs `config.iters` supersteps starting from `sources`.
    ///
    /// # Errors
    ///
    /// Raised before any worker starts:
    /// - [`BspError::InvalidConfig`] for a bad config, an election naming a
    ///   worker that does not exist, or sources on an empty graph.
    /// - [`BspError::UnknownNode`] for a source that is not in the graph.
    ///
    /// Raised by workers (the run is discarded):
    /// - [`BspError::WorkerPanicked`] if a worker thread panicked.
    /// - [`BspError::BrokenBarrier`] on a barrier deadline or poisoned state.
    #[instrument(skip_all, fields(workers = self.config.workers, iters = self.config.iters))]
    pub fn run<I, S>(&self, sources: I) -> Result<SimOutcome, BspError>
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.config.validate()?;
        if self.election.coordinator().index() >= self.config.workers {
            return Err(BspError::InvalidConfig(format!(
                "elected worker {} does not exist with {} workers",
                self.election.coordinator(),
                self.config.workers
            )));
        }
        let sources = resolve_sources(self.graph, sources)?;

        let nodes = self.graph.nodes();
        let partitions = partition_round_robin(&nodes, self.config.workers)?;
        let state = SharedState::new(&nodes, &sources);
        let barrier = PhaseBarrier::new(self.config.workers, self.config.barrier_timeout())?;
        let history = Mutex::new(history_sink(self.config.iters));
        let ctx = WorkerContext {
            graph: self.graph,
            state: &state,
            barrier: &barrier,
            protocol: self.config.protocol,
            election: self.election,
            history: &history,
        };
        let workers: Vec<DiffusionWorker> =
            partitions.iter().cloned().map(DiffusionWorker::new).collect();

        info!(
            nodes = nodes.len(),
            sources = sources.len(),
            protocol = ?self.config.protocol,
            "starting simulation"
        );

        let start = Instant::now();
        let results: Vec<(WorkerId, std::thread::Result<Result<(), BspError>>)> =
            std::thread::scope(|s| {
                let handles: Vec<_> = workers
                    .iter()
                    .map(|worker| {
                        let ctx = &ctx;
                        let iters = self.config.iters;
                        (worker.id(), s.spawn(move || worker.run(ctx, iters)))
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|(id, handle)| (id, handle.join()))
                    .collect()
            });
        let elapsed = start.elapsed();

        first_failure(results)?;

        let knowledge = state.knowledge.into_inner()?;
        let history = history
            .into_inner()
            .map_err(|_| BspError::BrokenBarrier("history lock poisoned".to_owned()))?;

        info!(
            known = known_nodes(&knowledge).len(),
            elapsed_ms = elapsed.as_millis(),
            "simulation finished"
        );

        Ok(SimOutcome {
            knowledge,
            elapsed,
            history,
            partitions,
        })
    }
}

/// Entry contract: final knowledge and elapsed seconds.
///
/// # Errors
///
/// See [`Simulation::run`].
pub fn run<I, S>(
    graph: &Graph,
    initial_sources: I,
    workers: usize,
    iters: usize,
) -> Result<(Knowledge, f64), BspError>
where
    I: IntoIterator<Item = S>,
    S: Into<NodeId>,
{
    let outcome = Simulation::new(graph, SimConfig::new(workers, iters)).run(initial_sources)?;
    let secs = outcome.elapsed_secs();
    Ok((outcome.knowledge, secs))
}

/// Upper bound on the history reserved up front; longer runs grow on demand.
const HISTORY_RESERVE: usize = 1024;

fn history_sink(iters: usize) -> Vec<SuperstepRecord> {
    Vec::with_capacity(iters.min(HISTORY_RESERVE))
}

fn resolve_sources<I, S>(graph: &Graph, sources: I) -> Result<BTreeSet<NodeId>, BspError>
where
    I: IntoIterator<Item = S>,
    S: Into<NodeId>,
{
    let sources: BTreeSet<NodeId> = sources.into_iter().map(Into::into).collect();
    if graph.is_empty() && !sources.is_empty() {
        return Err(BspError::InvalidConfig(
            "sources given for an empty graph".to_owned(),
        ));
    }
    if let Some(unknown) = sources.iter().find(|id| !graph.contains(id)) {
        return Err(BspError::UnknownNode(unknown.clone()));
    }
    Ok(sources)
}

/// Picks the error to surface: a panic is the root cause of every
/// `BrokenBarrier` it triggers, so it wins; otherwise the lowest worker's error.
fn first_failure(
    results: Vec<(WorkerId, std::thread::Result<Result<(), BspError>>)>,
) -> Result<(), BspError> {
    let mut first_err = None;
    for (id, result) in results {
        match result {
            Err(_) => {
                warn!(worker = %id, "worker panicked");
                return Err(BspError::WorkerPanicked(id));
            }
            Ok(Err(err)) => {
                warn!(worker = %id, %err, "worker failed");
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
            Ok(Ok(())) => {}
        }
    }
    first_err.map_or(Ok(()), Err)
}
