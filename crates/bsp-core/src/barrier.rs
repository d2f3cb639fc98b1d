// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reusable generation-counted rendezvous with an optional deadline.
//!
//! `std::sync::Barrier` cannot time out and cannot be broken, so a crashed
//! participant would hang every peer forever. [`PhaseBarrier`] adds both: a
//! waiter that outlives the deadline breaks the barrier, and
//! [`PhaseBarrier::abort`] breaks it explicitly. Once broken, every current
//! and future `wait` fails with [`BspError::BrokenBarrier`].

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::BspError;

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    broken: Option<String>,
}

/// Outcome of a successful [`PhaseBarrier::wait`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierWaitResult {
    leader: bool,
    generation: u64,
}

impl BarrierWaitResult {
    /// `true` for exactly one participant per generation (the last to arrive).
    pub fn is_leader(&self) -> bool {
        self.leader
    }

    /// The generation this wait completed.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Rendezvous point for a fixed number of participants.
#[derive(Debug)]
pub struct PhaseBarrier {
    parties: usize,
    timeout: Option<Duration>,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl PhaseBarrier {
    /// Creates a barrier for `parties` participants.
    ///
    /// With `timeout = Some(d)`, a participant that waits longer than `d`
    /// for its generation to fill breaks the barrier.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::InvalidConfig`] if `parties == 0`.
    pub fn new(parties: usize, timeout: Option<Duration>) -> Result<Self, BspError> {
        if parties == 0 {
            return Err(BspError::InvalidConfig(
                "barrier needs at least one participant".to_owned(),
            ));
        }
        Ok(Self {
            parties,
            timeout,
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        })
    }

    /// Number of participants per generation.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Number of generations completed so far.
    pub fn generation(&self) -> u64 {
        self.lock().map_or(0, |state| state.generation)
    }

    /// Returns `true` once the barrier has been broken.
    pub fn is_broken(&self) -> bool {
        self.lock().map_or(true, |state| state.broken.is_some())
    }

    /// Blocks until all participants of the current generation have arrived.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::BrokenBarrier`] if the barrier is (or becomes)
    /// broken, or if this participant's deadline elapses first.
    pub fn wait(&self) -> Result<BarrierWaitResult, BspError> {
        let mut state = self.lock()?;
        if let Some(reason) = &state.broken {
            return Err(BspError::BrokenBarrier(reason.clone()));
        }

        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation += 1;
            self.cvar.notify_all();
            return Ok(BarrierWaitResult {
                leader: true,
                generation,
            });
        }

        let deadline = self.timeout.map(|t| Instant::now() + t);
        loop {
            state = match deadline {
                None => self.cvar.wait(state).map_err(|_| poisoned())?,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        let reason = format!(
                            "generation {generation} timed out with {} of {} participants",
                            state.arrived, self.parties
                        );
                        return Err(Self::break_locked(&mut state, &self.cvar, reason));
                    }
                    self.cvar
                        .wait_timeout(state, deadline - now)
                        .map_err(|_| poisoned())?
                        .0
                }
            };
            // Release wins over a break that happened after this generation filled.
            if state.generation != generation {
                return Ok(BarrierWaitResult {
                    leader: false,
                    generation,
                });
            }
            if let Some(reason) = &state.broken {
                return Err(BspError::BrokenBarrier(reason.clone()));
            }
        }
    }

    /// Breaks the barrier, waking every waiter with [`BspError::BrokenBarrier`].
    ///
    /// The first reason is kept; later aborts are no-ops.
    pub fn abort(&self, reason: impl Into<String>) {
        // A poisoned lock already fails every waiter.
        if let Ok(mut state) = self.state.lock() {
            Self::break_locked(&mut state, &self.cvar, reason.into());
        }
    }

    fn break_locked(state: &mut BarrierState, cvar: &Condvar, reason: String) -> BspError {
        let reason = if let Some(existing) = state.broken.clone() {
            existing
        } else {
            warn!(generation = state.generation, %reason, "barrier broken");
            state.broken = Some(reason.clone());
            reason
        };
        cvar.notify_all();
        BspError::BrokenBarrier(reason)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BarrierState>, BspError> {
        self.state.lock().map_err(|_| poisoned())
    }
}

fn poisoned() -> BspError {
    BspError::BrokenBarrier("barrier lock poisoned".to_owned())
}
