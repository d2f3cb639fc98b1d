// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types for graph nodes and workers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Strongly typed identifier for a node in the diffusion graph.
///
/// Ordering is lexicographic on the underlying label. That ordering is the
/// node rank used by the partitioner, so it must stay stable.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node id from a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for NodeId {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Identifier for a worker (partition owner). Dense, `0..workers`.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub usize);

impl WorkerId {
    /// Returns the dense index of this worker.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_order_lexicographically() {
        let mut ids = vec![NodeId::from("C"), NodeId::from("A"), NodeId::from("B")];
        ids.sort();
        let labels: Vec<&str> = ids.iter().map(NodeId::as_str).collect();
        assert_eq!(labels, ["A", "B", "C"]);
    }

    #[test]
    fn worker_id_displays_with_prefix() {
        assert_eq!(WorkerId(3).to_string(), "w3");
    }

    #[test]
    fn node_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&NodeId::from("A")).expect("serialize");
        assert_eq!(json, "\"A\"");
    }
}
