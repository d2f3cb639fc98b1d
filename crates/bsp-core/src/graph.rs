// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable directed graph shared read-only by all workers.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::BspError;
use crate::ident::NodeId;

/// Raw adjacency form used on the serde boundary.
pub type Adjacency = BTreeMap<NodeId, Vec<NodeId>>;

/// Directed graph: node id to ordered neighbor ids.
///
/// Every neighbor is guaranteed to be a key of the graph; construction
/// rejects dangling edges with [`BspError::UnknownNode`]. Keys are held in a
/// `BTreeMap`, so [`Graph::nodes`] is the lexicographic node rank.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Adjacency", into = "Adjacency")]
pub struct Graph {
    adjacency: Adjacency,
}

impl Graph {
    /// Builds a graph from `(node, neighbors)` pairs.
    ///
    /// # Errors
    ///
    /// - [`BspError::InvalidConfig`] if a node appears twice as a key.
    /// - [`BspError::UnknownNode`] if a neighbor is not itself a key.
    pub fn from_adjacency<I, K, N, V>(entries: I) -> Result<Self, BspError>
    where
        I: IntoIterator<Item = (K, N)>,
        K: Into<NodeId>,
        N: IntoIterator<Item = V>,
        V: Into<NodeId>,
    {
        let mut adjacency = Adjacency::new();
        for (node, neighbors) in entries {
            match adjacency.entry(node.into()) {
                Entry::Occupied(slot) => {
                    return Err(BspError::InvalidConfig(format!(
                        "node {} listed twice",
                        slot.key()
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(neighbors.into_iter().map(Into::into).collect());
                }
            }
        }
        Self::validated(adjacency)
    }

    /// Parses a JSON object of the form `{"A": ["B", "C"], "B": []}`.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::InvalidConfig`] for malformed JSON and
    /// [`BspError::UnknownNode`] for dangling edges.
    pub fn from_json(json: &str) -> Result<Self, BspError> {
        let adjacency: Adjacency = serde_json::from_str(json)
            .map_err(|e| BspError::InvalidConfig(format!("graph json: {e}")))?;
        Self::validated(adjacency)
    }

    fn validated(adjacency: Adjacency) -> Result<Self, BspError> {
        for neighbors in adjacency.values() {
            if let Some(missing) = neighbors.iter().find(|n| !adjacency.contains_key(*n)) {
                return Err(BspError::UnknownNode(missing.clone()));
            }
        }
        Ok(Self { adjacency })
    }

    /// Returns the node set in lexicographic order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.adjacency.keys().cloned().collect()
    }

    /// Returns the ordered out-neighbors of `node` (empty for sinks and unknown ids).
    pub fn neighbors(&self, node: &NodeId) -> &[NodeId] {
        self.adjacency.get(node).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if `node` is a key of the graph.
    pub fn contains(&self, node: &NodeId) -> bool {
        self.adjacency.contains_key(node)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }
}

impl TryFrom<Adjacency> for Graph {
    type Error = BspError;

    fn try_from(adjacency: Adjacency) -> Result<Self, Self::Error> {
        Self::validated(adjacency)
    }
}

impl From<Graph> for Adjacency {
    fn from(graph: Graph) -> Self {
        graph.adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_are_sorted_regardless_of_insertion_order() {
        let graph = Graph::from_adjacency([
            ("C", vec![]),
            ("A", vec!["C"]),
            ("B", vec!["A"]),
        ])
        .expect("valid graph");
        let labels: Vec<String> = graph.nodes().iter().map(ToString::to_string).collect();
        assert_eq!(labels, ["A", "B", "C"]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn dangling_neighbor_is_rejected() {
        let err = Graph::from_adjacency([("A", vec!["Z"])]).expect_err("dangling edge");
        assert_eq!(err, BspError::UnknownNode(NodeId::from("Z")));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let err = Graph::from_adjacency([("A", Vec::<&str>::new()), ("A", Vec::new())])
            .expect_err("duplicate");
        assert!(matches!(err, BspError::InvalidConfig(_)));
    }

    #[test]
    fn neighbors_of_sink_is_empty() {
        let graph = Graph::from_adjacency([("A", vec!["B"]), ("B", vec![])]).expect("valid");
        assert!(graph.neighbors(&NodeId::from("B")).is_empty());
        assert_eq!(graph.neighbors(&NodeId::from("A")), [NodeId::from("B")]);
    }

    #[test]
    fn json_round_trip_keeps_neighbor_order() {
        let graph = Graph::from_json(r#"{"A": ["C", "B"], "B": [], "C": []}"#).expect("parse");
        assert_eq!(
            graph.neighbors(&NodeId::from("A")),
            [NodeId::from("C"), NodeId::from("B")]
        );
        let json = serde_json::to_string(&graph).expect("serialize");
        let back: Graph = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, graph);
    }

    #[test]
    fn json_with_dangling_edge_fails_through_serde_too() {
        let res: Result<Graph, _> = serde_json::from_str(r#"{"A": ["B"]}"#);
        assert!(res.is_err());
        assert_eq!(
            Graph::from_json(r#"{"A": ["B"]}"#),
            Err(BspError::UnknownNode(NodeId::from("B")))
        );
    }
}
