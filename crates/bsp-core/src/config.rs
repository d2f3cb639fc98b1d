// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Run configuration for the simulation driver.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BspError;

/// Default worker count.
pub const DEFAULT_WORKERS: usize = 2;
/// Default number of supersteps.
pub const DEFAULT_ITERS: usize = 5;

/// Barrier generations issued per superstep.
///
/// Both variants produce identical knowledge; `ThreePhase` adds an explicit
/// rendezvous right before the merge so the merge window has an observable
/// start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarrierProtocol {
    /// compute barrier, merge-window barrier, post-merge barrier.
    #[default]
    ThreePhase,
    /// compute barrier, post-merge barrier.
    TwoPhase,
}

impl BarrierProtocol {
    /// Barrier waits per superstep.
    pub fn waits_per_superstep(self) -> u64 {
        match self {
            Self::ThreePhase => 3,
            Self::TwoPhase => 2,
        }
    }

    /// Whether the protocol issues the merge-window barrier.
    pub fn has_merge_window(self) -> bool {
        matches!(self, Self::ThreePhase)
    }
}

/// Parameters for one simulation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Number of parallel workers (>= 1).
    pub workers: usize,
    /// Number of supersteps to run.
    pub iters: usize,
    /// Barrier generations per superstep.
    pub protocol: BarrierProtocol,
    /// Per-wait barrier deadline in milliseconds; `None` waits forever.
    pub barrier_timeout_ms: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            iters: DEFAULT_ITERS,
            protocol: BarrierProtocol::default(),
            barrier_timeout_ms: None,
        }
    }
}

impl SimConfig {
    /// Config with the given worker and superstep counts, defaults elsewhere.
    pub fn new(workers: usize, iters: usize) -> Self {
        Self {
            workers,
            iters,
            ..Self::default()
        }
    }

    /// Builds a config from signed counts as they arrive from a command line.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::InvalidConfig`] if `workers < 1` or `iters < 0`.
    pub fn from_signed(workers: i64, iters: i64) -> Result<Self, BspError> {
        let workers = usize::try_from(workers)
            .ok()
            .filter(|w| *w >= 1)
            .ok_or_else(|| {
                BspError::InvalidConfig(format!("workers must be >= 1, got {workers}"))
            })?;
        let iters = usize::try_from(iters)
            .map_err(|_| BspError::InvalidConfig(format!("iters must be >= 0, got {iters}")))?;
        Ok(Self::new(workers, iters))
    }

    /// Sets the barrier protocol.
    pub fn with_protocol(mut self, protocol: BarrierProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Sets the per-wait barrier deadline.
    pub fn with_barrier_timeout(mut self, timeout: Duration) -> Self {
        self.barrier_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Per-wait barrier deadline.
    pub fn barrier_timeout(&self) -> Option<Duration> {
        self.barrier_timeout_ms.map(Duration::from_millis)
    }

    /// Checks the invariants the driver relies on.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::InvalidConfig`] if `workers == 0` or the barrier
    /// deadline is zero.
    pub fn validate(&self) -> Result<(), BspError> {
        if self.workers == 0 {
            return Err(BspError::InvalidConfig("workers must be >= 1, got 0".to_owned()));
        }
        if self.barrier_timeout_ms == Some(0) {
            return Err(BspError::InvalidConfig(
                "barrier timeout must be > 0 ms".to_owned(),
            ));
        }
        Ok(())
    }

    /// Parses a JSON config document; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::InvalidConfig`] on malformed JSON, unknown fields,
    /// or a config that fails [`SimConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, BspError> {
        let config = Self::parse_json(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON config document without validating it, for callers that
    /// layer overrides on top and validate the merged result.
    ///
    /// # Errors
    ///
    /// Returns [`BspError::InvalidConfig`] on malformed JSON or unknown fields.
    pub fn parse_json(json: &str) -> Result<Self, BspError> {
        serde_json::from_str(json).map_err(|e| BspError::InvalidConfig(format!("config json: {e}")))
    }
}
