// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Console rendering of a finished run.

use anyhow::Result;
use bsp_core::{BarrierProtocol, SimConfig, SimOutcome, SuperstepRecord};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// JSON report document.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    /// Initial information sources.
    pub sources: &'a [String],
    /// Worker count used.
    pub workers: usize,
    /// Supersteps run.
    pub iters: usize,
    /// Barrier protocol used.
    pub protocol: BarrierProtocol,
    /// Wall-clock seconds.
    pub elapsed_seconds: f64,
    /// Final per-node status.
    pub knowledge: &'a bsp_core::Knowledge,
    /// Zero-based index of the first superstep with no new nodes, if reached.
    pub fixed_point_at: Option<u64>,
    /// Per-superstep merge records.
    pub history: &'a [SuperstepRecord],
}

impl<'a> RunReport<'a> {
    /// Builds the report for `outcome`.
    pub fn new(sources: &'a [String], config: &SimConfig, outcome: &'a SimOutcome) -> Self {
        Self {
            sources,
            workers: config.workers,
            iters: config.iters,
            protocol: config.protocol,
            elapsed_seconds: outcome.elapsed_secs(),
            knowledge: &outcome.knowledge,
            fixed_point_at: outcome.fixed_point_at(),
            history: &outcome.history,
        }
    }

    /// Pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable report: sources, per-node status table, timing.
    pub fn to_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Node", "Status"]);
        for (node, known) in self.knowledge {
            let status = if *known { "informed" } else { "not informed" };
            table.add_row(vec![node.to_string(), status.to_owned()]);
        }

        let fixed_point = self
            .fixed_point_at
            .map_or_else(|| "not reached".to_owned(), |s| format!("superstep {s}"));

        format!(
            "Initial sources: {}\n\nFinal state after {} supersteps ({} workers):\n{table}\n\nFixed point: {fixed_point}\nElapsed: {:.3}s",
            self.sources.join(", "),
            self.iters,
            self.workers,
            self.elapsed_seconds,
        )
    }
}
