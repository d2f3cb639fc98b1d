// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeSet;

use bsp_core::{demo::social, Graph, NodeId};

/// Worker counts every invariance test sweeps.
pub const WORKER_COUNTS: &[usize] = &[1, 2, 3, 4, 7, 8, 16];

/// Seeds for randomized graphs.
pub const SEEDS: &[u64] = &[
    0x0000_0000_0000_0001,
    0x1234_5678_9ABC_DEF0,
    0xDEAD_BEEF_CAFE_BABE,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// SplitMix64 stream; enough randomness for graph fixtures without `rand`.
#[derive(Clone, Debug)]
pub struct SplitMix64(u64);

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Index in `0..bound`; `bound == 0` yields 0.
    pub fn below(&mut self, bound: usize) -> usize {
        match u64::try_from(bound) {
            Ok(0) | Err(_) => 0,
            Ok(b) => usize::try_from(self.next_u64() % b).unwrap_or(0),
        }
    }
}

/// Node label with zero padding so lexicographic rank matches index.
pub fn label(i: usize) -> String {
    format!("n{i:04}")
}

/// Random directed graph with `nodes` nodes and up to `max_degree` out-edges each.
pub fn random_graph(rng: &mut SplitMix64, nodes: usize, max_degree: usize) -> Graph {
    let entries: Vec<(String, Vec<String>)> = (0..nodes)
        .map(|i| {
            let degree = rng.below(max_degree + 1);
            let neighbors = (0..degree)
                .map(|_| label(rng.below(nodes)))
                .collect();
            (label(i), neighbors)
        })
        .collect();
    Graph::from_adjacency(entries).expect("random graph only references its own nodes")
}

/// Single-threaded reference diffusion: `iters` synchronous rounds.
pub fn reference_known(graph: &Graph, sources: &[NodeId], iters: usize) -> BTreeSet<NodeId> {
    let mut known: BTreeSet<NodeId> = sources.iter().cloned().collect();
    for _ in 0..iters {
        let spread: Vec<NodeId> = known
            .iter()
            .flat_map(|n| graph.neighbors(n).iter().cloned())
            .collect();
        known.extend(spread);
    }
    known
}

/// The demo graph.
pub fn social() -> Graph {
    social::social_graph().expect("built-in graph is valid")
}

/// Ids from labels.
pub fn ids(labels: &[&str]) -> Vec<NodeId> {
    labels.iter().copied().map(NodeId::from).collect()
}
