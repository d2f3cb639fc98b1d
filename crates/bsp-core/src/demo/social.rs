// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Demo social graph: a seven-node chain where each node tells the next one
//! or two.
//!
//! ```text
//! A -> {B, C}   B -> {C, D}   C -> {D, E}   D -> {E, F}
//! E -> {F}      F -> {G}      G -> {}
//! ```
//!
//! Seeded at `A`, knowledge reaches every node after four supersteps.

use crate::error::BspError;
use crate::graph::Graph;

/// Default information sources for the demo graph.
pub const DEFAULT_SOURCES: &[&str] = &["A"];

/// Adjacency of the demo graph, in declaration order.
pub const SOCIAL_EDGES: &[(&str, &[&str])] = &[
    ("A", &["B", "C"]),
    ("B", &["C", "D"]),
    ("C", &["D", "E"]),
    ("D", &["E", "F"]),
    ("E", &["F"]),
    ("F", &["G"]),
    ("G", &[]),
];

/// Builds the demo graph.
///
/// # Errors
///
/// Never fails for the built-in edge table; the `Result` mirrors
/// [`Graph::from_adjacency`].
pub fn social_graph() -> Result<Graph, BspError> {
    Graph::from_adjacency(
        SOCIAL_EDGES
            .iter()
            .map(|(node, neighbors)| (*node, neighbors.iter().copied())),
    )
}
