// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Barrier-guarded shared containers: authoritative knowledge and the
//! per-superstep publish buffer.
//!
//! Neither container relies on incidental memory visibility. Every access
//! goes through a lock, and the phase ordering that makes those accesses
//! race-free comes from [`crate::PhaseBarrier`]:
//!
//! | phase   | knowledge          | pending buffer          |
//! |---------|--------------------|-------------------------|
//! | compute | shared read        | idempotent `true` writes |
//! | merge   | exclusive write    | exclusive read + clear  |

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::BspError;
use crate::ident::NodeId;

/// Node id to "has received the information".
pub type Knowledge = BTreeMap<NodeId, bool>;

/// Returns the known nodes of `knowledge` in ascending order.
pub fn known_nodes(knowledge: &Knowledge) -> Vec<NodeId> {
    knowledge
        .iter()
        .filter(|(_, known)| **known)
        .map(|(id, _)| id.clone())
        .collect()
}

/// Authoritative cross-superstep knowledge. Written only by the merge step.
#[derive(Debug, Default)]
pub struct KnowledgeState {
    inner: RwLock<Knowledge>,
}

impl KnowledgeState {
    /// Initializes every node to `false`, except members of `sources`.
    pub fn from_sources(nodes: &[NodeId], sources: &BTreeSet<NodeId>) -> Self {
        let knowledge = nodes
            .iter()
            .map(|id| (id.clone(), sources.contains(id)))
            .collect();
        Self {
            inner: RwLock::new(knowledge),
        }
    }

    /// Read access for the compute phase.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::BrokenBarrier`] if a writer panicked mid-merge.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, Knowledge>, BspError> {
        self.inner.read().map_err(|_| poisoned("knowledge"))
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Knowledge>, BspError> {
        self.inner.write().map_err(|_| poisoned("knowledge"))
    }

    /// Copies the current map.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::BrokenBarrier`] if a writer panicked mid-merge.
    pub fn snapshot(&self) -> Result<Knowledge, BspError> {
        Ok(self.read()?.clone())
    }

    /// Consumes the container, returning the final map.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::BrokenBarrier`] if a writer panicked mid-merge.
    pub fn into_inner(self) -> Result<Knowledge, BspError> {
        self.inner.into_inner().map_err(|_| poisoned("knowledge"))
    }
}

/// Nodes discovered as newly informed during the current compute phase.
#[derive(Debug, Default)]
pub struct PendingBuffer {
    inner: Mutex<Knowledge>,
}

impl PendingBuffer {
    /// Publishes `ids` with value `true`. Overwrites are idempotent, so
    /// workers reaching the same target write the same entry harmlessly.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::BrokenBarrier`] if the buffer lock is poisoned.
    pub fn publish<I>(&self, ids: I) -> Result<(), BspError>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut pending = self.lock()?;
        for id in ids {
            pending.insert(id, true);
        }
        Ok(())
    }

    /// Number of entries currently buffered.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::BrokenBarrier`] if the buffer lock is poisoned.
    pub fn len(&self) -> Result<usize, BspError> {
        Ok(self.lock()?.len())
    }

    /// Returns `true` if nothing is buffered.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::BrokenBarrier`] if the buffer lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, BspError> {
        Ok(self.lock()?.is_empty())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Knowledge>, BspError> {
        self.inner.lock().map_err(|_| poisoned("pending buffer"))
    }
}

/// The state handles every worker shares for the lifetime of a run.
#[derive(Debug, Default)]
pub struct SharedState {
    /// Authoritative knowledge.
    pub knowledge: KnowledgeState,
    /// Publish buffer, empty at the start of every superstep.
    pub pending: PendingBuffer,
}

impl SharedState {
    /// Fresh state: knowledge seeded from `sources`, empty buffer.
    pub fn new(nodes: &[NodeId], sources: &BTreeSet<NodeId>) -> Self {
        Self {
            knowledge: KnowledgeState::from_sources(nodes, sources),
            pending: PendingBuffer::default(),
        }
    }
}

fn poisoned(what: &str) -> BspError {
    BspError::BrokenBarrier(format!("{what} lock poisoned by a panicking worker"))
}
