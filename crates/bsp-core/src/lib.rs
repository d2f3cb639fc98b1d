// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! bsp-core: Bulk Synchronous Parallel diffusion engine.
//!
//! Graph nodes are partitioned round-robin among a fixed set of worker
//! threads. Each superstep, workers compute which neighbors of their known
//! nodes learn the information and publish them into a shared buffer; after a
//! barrier, one elected worker merges the buffer into the authoritative
//! knowledge map and clears it; a final barrier makes the merge visible
//! before the next superstep. No per-node locking is involved: correctness
//! comes from barrier-enforced phase ordering.
//!
//! ```
//! use bsp_core::{demo::social, run};
//!
//! let graph = social::social_graph()?;
//! let (knowledge, _elapsed) = run(&graph, social::DEFAULT_SOURCES.iter().copied(), 3, 5)?;
//! assert!(knowledge.values().all(|known| *known));
//! # Ok::<(), bsp_core::BspError>(())
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self
)]
// Tests assert with expect/panic freely.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod barrier;
mod config;
/// Demo graphs (the default seven-node social chain).
pub mod demo;
mod driver;
mod error;
mod graph;
mod ident;
mod merge;
mod partition;
mod state;
mod worker;

/// Generation-counted rendezvous with deadline and abort.
pub use barrier::{BarrierWaitResult, PhaseBarrier};
/// Run configuration and barrier protocol selection.
pub use config::{BarrierProtocol, SimConfig, DEFAULT_ITERS, DEFAULT_WORKERS};
/// Simulation driver and its outcome.
pub use driver::{run, SimOutcome, Simulation};
/// Error taxonomy.
pub use error::BspError;
/// Immutable directed graph.
pub use graph::{Adjacency, Graph};
/// Node and worker identifiers.
pub use ident::{NodeId, WorkerId};
/// Single-writer merge and coordinator election.
pub use merge::{merge_pending, Election, SuperstepRecord};
/// Round-robin partitioner.
pub use partition::{owner_of, partition_round_robin, Partition};
/// Shared knowledge and publish buffer.
pub use state::{known_nodes, Knowledge, KnowledgeState, PendingBuffer, SharedState};
/// Diffusion worker and its superstep phases.
pub use worker::{compute_local_spread, DiffusionWorker, Phase, WorkerContext};
