//! Cross-mode comparison: one fresh engine per governance mode.
//!
//! Every engine is built from the same config with the same resolved seed, so
//! all modes see the identical cohort (ids and types) and differ only in what
//! governance does to contributions and rewards.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::core::summary::{TrendSummary, summarize};
use crate::core::types::{Governance, RoundRecord};
use crate::engine::Engine;
use crate::error::{Result, SimError};
use crate::io::config::SimConfig;
use crate::io::export::{Columns, write_csv};
use crate::io::report::{render_report, write_report};

/// Records of one governed run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeRun {
    pub governance: Governance,
    pub records: Vec<RoundRecord>,
}

/// Result of running several modes with one seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Config with the resolved seed filled in.
    pub config: SimConfig,
    pub seed: u64,
    pub runs: Vec<ModeRun>,
}

impl Comparison {
    /// All records, mode by mode, in run order.
    pub fn records(&self) -> Vec<RoundRecord> {
        self.runs
            .iter()
            .flat_map(|run| run.records.iter().cloned())
            .collect()
    }

    pub fn run(&self, governance: Governance) -> Option<&ModeRun> {
        self.runs.iter().find(|run| run.governance == governance)
    }

    pub fn summary(&self) -> TrendSummary {
        summarize(&self.records())
    }
}

/// Run each mode in `modes` from a fresh engine.
#[instrument(skip_all, fields(modes = modes.len()))]
pub fn run_modes(config: &SimConfig, modes: &[Governance]) -> Result<Comparison> {
    let seed = config.seed.unwrap_or_else(rand::random);
    let config = SimConfig {
        seed: Some(seed),
        ..config.clone()
    };

    let mut runs = Vec::with_capacity(modes.len());
    for &governance in modes {
        let mut engine = Engine::new(config.clone())?;
        let records = engine.run(governance).to_vec();
        debug!(%governance, records = records.len(), "mode finished");
        runs.push(ModeRun {
            governance,
            records,
        });
    }
    info!(seed, "comparison complete");
    Ok(Comparison { config, seed, runs })
}

/// Files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub per_mode: Vec<PathBuf>,
    pub combined: PathBuf,
    pub summary: PathBuf,
    pub report: PathBuf,
}

/// Write per-mode CSVs, the combined CSV, `summary.json` and `report.md`.
pub fn write_outputs(out_dir: &Path, comparison: &Comparison) -> Result<OutputPaths> {
    fs::create_dir_all(out_dir).map_err(|err| SimError::io(out_dir, err))?;

    let mut per_mode = Vec::with_capacity(comparison.runs.len());
    for run in &comparison.runs {
        let path = out_dir.join(format!("{}.csv", run.governance.file_stem()));
        write_csv(&path, &run.records, Columns::BASE)?;
        per_mode.push(path);
    }

    let combined = out_dir.join("public_goods.csv");
    write_csv(&combined, &comparison.records(), Columns::LABELLED)?;

    let summary = comparison.summary();
    let summary_path = out_dir.join("summary.json");
    let mut payload =
        serde_json::to_string_pretty(&summary).map_err(|err| SimError::Serialize(err.to_string()))?;
    payload.push('\n');
    fs::write(&summary_path, payload).map_err(|err| SimError::io(&summary_path, err))?;

    let report_path = out_dir.join("report.md");
    let report = render_report(&comparison.config, comparison.seed, &summary)?;
    write_report(&report_path, &report)?;

    Ok(OutputPaths {
        per_mode,
        combined,
        summary: summary_path,
        report: report_path,
    })
}
