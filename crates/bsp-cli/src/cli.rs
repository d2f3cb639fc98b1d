// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Argument parsing and config resolution.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bsp_core::{demo::social, BarrierProtocol, Graph, SimConfig};
use clap::{ArgAction, Parser, ValueEnum};

/// Bulk Synchronous Parallel information diffusion simulator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Number of parallel workers (>= 1) [default: 2]
    #[arg(long, env = "BSP_WORKERS", allow_negative_numbers = true)]
    pub workers: Option<i64>,

    /// Number of supersteps (>= 0) [default: 5]
    #[arg(long, env = "BSP_ITERS", allow_negative_numbers = true)]
    pub iters: Option<i64>,

    /// JSON adjacency file (`{"A": ["B"], "B": []}`); defaults to the demo graph
    #[arg(long)]
    pub graph: Option<PathBuf>,

    /// Node that starts with the information (repeatable)
    #[arg(long = "source", default_value = "A")]
    pub sources: Vec<String>,

    /// Barrier generations per superstep
    #[arg(long, value_enum)]
    pub protocol: Option<ProtocolArg>,

    /// Fail the run if a barrier wait exceeds this many milliseconds
    #[arg(long)]
    pub barrier_timeout_ms: Option<u64>,

    /// JSON `SimConfig` file; explicit flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); `RUST_LOG` wins
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// CLI spelling of [`BarrierProtocol`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    /// Compute, merge-window, and post-merge barriers.
    ThreePhase,
    /// Compute and post-merge barriers only.
    TwoPhase,
}

impl From<ProtocolArg> for BarrierProtocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::ThreePhase => Self::ThreePhase,
            ProtocolArg::TwoPhase => Self::TwoPhase,
        }
    }
}

/// Report format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Per-node status table plus timing.
    Table,
    /// Machine-readable JSON document.
    Json,
}

impl Args {
    /// Merges the optional config file with explicit flags.
    pub fn resolve_config(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                SimConfig::parse_json(&json)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => SimConfig::default(),
        };

        let workers = self
            .workers
            .unwrap_or_else(|| i64::try_from(config.workers).unwrap_or(i64::MAX));
        let iters = self
            .iters
            .unwrap_or_else(|| i64::try_from(config.iters).unwrap_or(i64::MAX));
        let counts = SimConfig::from_signed(workers, iters)?;
        config.workers = counts.workers;
        config.iters = counts.iters;

        if let Some(protocol) = self.protocol {
            config.protocol = protocol.into();
        }
        if let Some(ms) = self.barrier_timeout_ms {
            config.barrier_timeout_ms = Some(ms);
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads `--graph`, or the demo graph when absent.
    pub fn load_graph(&self) -> Result<Graph> {
        match &self.graph {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading graph {}", path.display()))?;
                Graph::from_json(&json).with_context(|| format!("loading graph {}", path.display()))
            }
            None => Ok(social::social_graph()?),
        }
    }
}
