// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Worker-count invariance on randomized graphs.
//!
//! Parallelism must not affect the result: 1 worker and N workers produce
//! the same final knowledge and the same per-superstep history, and both
//! agree with a single-threaded reference diffusion.

mod common;

use std::collections::BTreeSet;

use bsp_core::{BarrierProtocol, Election, NodeId, SimConfig, Simulation, WorkerId};
use common::{label, random_graph, reference_known, SplitMix64, SEEDS, WORKER_COUNTS};

#[test]
fn random_graphs_are_worker_count_invariant() {
    for &seed in SEEDS {
        let mut rng = SplitMix64::new(seed);
        let graph = random_graph(&mut rng, 60, 3);
        let sources = vec![NodeId::new(label(rng.below(60)))];

        let baseline = Simulation::new(&graph, SimConfig::new(1, 8))
            .run(sources.clone())
            .expect("baseline run");
        let reference = reference_known(&graph, &sources, 8);
        assert_eq!(
            baseline.known_nodes(),
            reference.into_iter().collect::<Vec<_>>(),
            "engine disagrees with reference (seed={seed:#x})"
        );

        for &workers in WORKER_COUNTS {
            let outcome = Simulation::new(&graph, SimConfig::new(workers, 8))
                .run(sources.clone())
                .expect("run");
            assert_eq!(
                baseline.knowledge, outcome.knowledge,
                "knowledge differs (seed={seed:#x}, workers={workers})"
            );
            assert_eq!(
                baseline.history, outcome.history,
                "history differs (seed={seed:#x}, workers={workers})"
            );
        }
    }
}

#[test]
fn protocol_and_election_do_not_change_the_result() {
    let mut rng = SplitMix64::new(0xB5B5_0000_0000_0001);
    let graph = random_graph(&mut rng, 40, 4);
    let sources = [label(0), label(17)];

    let baseline = Simulation::new(&graph, SimConfig::new(4, 6))
        .run(sources.clone())
        .expect("baseline run");

    for protocol in [BarrierProtocol::ThreePhase, BarrierProtocol::TwoPhase] {
        for coordinator in 0..4 {
            let outcome = Simulation::new(&graph, SimConfig::new(4, 6).with_protocol(protocol))
                .with_election(Election::fixed(WorkerId(coordinator)))
                .run(sources.clone())
                .expect("run");
            assert_eq!(
                baseline.knowledge, outcome.knowledge,
                "knowledge differs (protocol={protocol:?}, coordinator={coordinator})"
            );
        }
    }
}

#[test]
fn buffer_is_empty_before_every_compute_phase() {
    let mut rng = SplitMix64::new(42);
    let graph = random_graph(&mut rng, 80, 5);
    for &workers in WORKER_COUNTS {
        let outcome = Simulation::new(&graph, SimConfig::new(workers, 10))
            .run([label(3)])
            .expect("run");
        for record in &outcome.history {
            assert_eq!(
                record.pending_after_clear, 0,
                "buffer not empty after superstep {} with {workers} workers",
                record.superstep
            );
        }
    }
}

#[test]
fn knowledge_is_monotone_across_supersteps() {
    let mut rng = SplitMix64::new(7);
    let graph = random_graph(&mut rng, 50, 2);
    let outcome = Simulation::new(&graph, SimConfig::new(5, 12))
        .run([label(0), label(25)])
        .expect("run");

    let mut known: BTreeSet<NodeId> =
        [label(0), label(25)].into_iter().map(NodeId::new).collect();
    for record in &outcome.history {
        for node in &record.newly_informed {
            assert!(
                known.insert(node.clone()),
                "{node} reported as new twice (superstep {})",
                record.superstep
            );
        }
        assert_eq!(
            record.known_count,
            known.len(),
            "known count shrank or skipped in superstep {}",
            record.superstep
        );
    }
    assert_eq!(outcome.known_nodes(), known.into_iter().collect::<Vec<_>>());
}
