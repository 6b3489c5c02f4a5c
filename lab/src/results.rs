//! Result capture and persistence.
//!
//! Writes a run's records, trend summary and metadata to the results
//! directory for later aggregation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use pgg::compare::Comparison;
use pgg::core::types::Governance;
use pgg::io::export::{Columns, write_csv};

use crate::outcome::Outcome;

/// Input for capturing results from a finished run.
#[derive(Debug)]
pub struct CaptureInput<'a> {
    pub experiment_id: &'a str,
    pub experiment_path: &'a Path,
    pub run_name: &'a str,
    pub seed: u64,
    pub modes: &'a [Governance],
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `None` when the simulation failed.
    pub comparison: Option<&'a Comparison>,
    /// Simulation failure, recorded as a non-fatal error.
    pub failure: Option<String>,
}

/// Metadata for a lab run, persisted to `meta.json`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunMeta {
    pub experiment_id: String,
    pub run_name: String,
    /// SHA-256 hash of the experiment file for reproducibility tracking.
    pub experiment_hash: String,
    pub seed: u64,
    pub modes: Vec<Governance>,
    pub outcome: Option<Outcome>,
    pub start_time: String,
    pub end_time: String,
    pub duration_secs: f64,
    /// Mean contribution of the last round, per mode.
    #[serde(default)]
    pub final_mean_contribution: BTreeMap<String, f64>,
    /// Non-fatal errors encountered during the run or capture.
    pub errors: Vec<String>,
}

/// Capture results from a finished run to the results directory.
#[instrument(skip_all, fields(experiment_id = %input.experiment_id, run_name = %input.run_name))]
pub fn capture_results(base_dir: &Path, input: &CaptureInput<'_>) -> Result<PathBuf> {
    let results_dir = results_dir(base_dir, input.experiment_id, input.run_name);
    fs::create_dir_all(&results_dir)
        .with_context(|| format!("create results dir {}", results_dir.display()))?;

    let mut errors: Vec<String> = input.failure.iter().cloned().collect();

    let experiment_hash = match file_sha256(input.experiment_path) {
        Ok(hash) => hash,
        Err(err) => {
            errors.push(format!("experiment hash: {err}"));
            String::new()
        }
    };

    let mut final_mean_contribution = BTreeMap::new();
    if let Some(comparison) = input.comparison {
        if let Err(err) = write_csv(
            &results_dir.join("records.csv"),
            &comparison.records(),
            Columns::LABELLED,
        ) {
            errors.push(format!("records.csv: {err}"));
        }
        let summary = comparison.summary();
        if let Err(err) = write_json(&results_dir.join("summary.json"), &summary) {
            errors.push(format!("summary.json: {err:#}"));
        }
        for mode in &summary.modes {
            final_mean_contribution.insert(
                mode.governance.to_string(),
                mode.final_mean_contribution,
            );
        }
    }

    if !errors.is_empty() {
        warn!(errors = ?errors, "run capture had errors");
    }

    let duration = input.finished_at - input.started_at;
    let meta = RunMeta {
        experiment_id: input.experiment_id.to_string(),
        run_name: input.run_name.to_string(),
        experiment_hash,
        seed: input.seed,
        modes: input.modes.to_vec(),
        outcome: None,
        start_time: input.started_at.to_rfc3339(),
        end_time: input.finished_at.to_rfc3339(),
        duration_secs: duration.num_milliseconds() as f64 / 1000.0,
        final_mean_contribution,
        errors,
    };

    write_json(&results_dir.join("meta.json"), &meta)?;
    debug!(results_dir = %results_dir.display(), "results captured");
    Ok(results_dir)
}

pub fn update_outcome(results_dir: &Path, outcome: Outcome) -> Result<()> {
    let meta_path = results_dir.join("meta.json");
    let mut meta: RunMeta = serde_json::from_str(
        &fs::read_to_string(&meta_path).with_context(|| format!("read {}", meta_path.display()))?,
    )
    .context("parse meta")?;
    meta.outcome = Some(outcome);
    write_json(&meta_path, &meta)?;
    Ok(())
}

pub fn results_dir(base_dir: &Path, experiment_id: &str, run_name: &str) -> PathBuf {
    base_dir.join(experiment_id).join(run_name)
}

/// Fresh run name: `{experiment_id}_{timestamp}_{suffix}`.
pub fn new_run_name(experiment_id: &str) -> String {
    build_run_name(experiment_id, &generate_timestamp(), &generate_short_id())
}

pub fn build_run_name(experiment_id: &str, timestamp: &str, short_id: &str) -> String {
    format!("{experiment_id}_{timestamp}_{short_id}")
}

fn generate_timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

fn generate_short_id() -> String {
    let mut rng = rand::thread_rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(6)
        .collect::<String>()
        .to_lowercase()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value).context("serialize json")?;
    fs::write(path, format!("{contents}\n"))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn file_sha256(path: &Path) -> Result<String> {
    let contents = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let digest = hasher.finalize();
    Ok(hex::encode(digest))
}
