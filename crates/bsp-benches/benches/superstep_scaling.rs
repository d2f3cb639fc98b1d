// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
// criterion_group!/criterion_main! expand to undocumented functions that cannot
// carry #[allow] (attributes on macro invocations are ignored). Crate-level
// suppress is required for benchmark binaries using Criterion.
#![allow(missing_docs, clippy::expect_used)]
//! Superstep throughput baselines.
//!
//! # Running
//!
//! ```sh
//! cargo bench --package bsp-benches --bench superstep_scaling
//! ```
//!
//! # What This Measures
//!
//! - `worker_scaling/N`: full runs over a layered graph with 1..16 workers
//! - `protocol/{three,two}_phase`: cost of the merge-window barrier
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use bsp_core::{BarrierProtocol, Graph, SimConfig, Simulation};

/// Layered graph: `layers` x `width` nodes, each node fans out to the whole
/// next layer, so every superstep informs one full layer.
fn layered_graph(layers: usize, width: usize) -> Graph {
    let label = |layer: usize, i: usize| format!("L{layer:03}/n{i:04}");
    Graph::from_adjacency((0..layers).flat_map(|layer| {
        (0..width).map(move |i| {
            let next: Vec<String> = if layer + 1 < layers {
                (0..width).map(|j| label(layer + 1, j)).collect()
            } else {
                Vec::new()
            };
            (label(layer, i), next)
        })
    }))
    .expect("layered graph is closed")
}

fn bench_worker_scaling(c: &mut Criterion) {
    let graph = layered_graph(16, 32);
    let mut group = c.benchmark_group("worker_scaling");
    group
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(4))
        .sample_size(30)
        .throughput(Throughput::Elements(graph.edge_count() as u64));

    for &workers in &[1usize, 2, 4, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &w| {
            b.iter(|| {
                let outcome = Simulation::new(&graph, SimConfig::new(w, 16))
                    .run(["L000/n0000"])
                    .expect("run");
                criterion::black_box(outcome.knowledge)
            });
        });
    }
    group.finish();
}

fn bench_protocol(c: &mut Criterion) {
    let graph = layered_graph(8, 8);
    let mut group = c.benchmark_group("protocol");
    group.sample_size(50);

    for (name, protocol) in [
        ("three_phase", BarrierProtocol::ThreePhase),
        ("two_phase", BarrierProtocol::TwoPhase),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let config = SimConfig::new(4, 32).with_protocol(protocol);
                let outcome = Simulation::new(&graph, config)
                    .run(["L000/n0000"])
                    .expect("run");
                criterion::black_box(outcome.history.len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_worker_scaling, bench_protocol);
criterion_main!(benches);
