// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! bsp-sim
//!
//! Runs the BSP diffusion engine over the demo graph (or a JSON graph file)
//! and prints the final per-node status and elapsed time.
//!
//! ```sh
//! bsp-sim --workers 3 --iters 5
//! bsp-sim --graph graph.json --source A --source D --format json
//! ```
// stdout is the report surface of this binary.
#![allow(clippy::print_stdout)]

mod cli;
mod report;

use anyhow::Result;
use bsp_core::Simulation;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Args, Format};
use report::RunReport;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let config = args.resolve_config()?;
    let graph = args.load_graph()?;
    info!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        workers = config.workers,
        iters = config.iters,
        "configuration resolved"
    );

    let outcome = Simulation::new(&graph, config.clone())
        .run(args.sources.iter().map(String::as_str))?;
    let report = RunReport::new(&args.sources, &config, &outcome);

    match args.format {
        Format::Table => println!("{}", report.to_table()),
        Format::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

/// Logs go to stderr so stdout stays a clean report.
fn init_tracing(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("setting default subscriber failed: {e}"))
}
