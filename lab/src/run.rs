//! Experiment execution orchestration.
//!
//! Coordinates config merging, the governed runs, checks and result capture.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use pgg::compare::run_modes;
use pgg::io::config::SimConfig;

use crate::config::{apply_experiment_config, run_seed};
use crate::experiment::ExperimentFile;
use crate::judge::{run_checks, write_judgment};
use crate::outcome::{Outcome, classify_outcome};
use crate::results::{CaptureInput, capture_results, new_run_name, update_outcome};

/// Result of running a single experiment run.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_name: String,
    pub seed: u64,
    /// Path to the results directory.
    pub results_dir: PathBuf,
    pub outcome: Outcome,
}

/// Run one repetition of an experiment: simulate every mode, check, capture.
///
/// `run_index` is zero-based and selects the seed when one is pinned.
#[instrument(
    skip(results_base, experiment_path, experiment),
    fields(experiment_id = %experiment.experiment.id)
)]
pub fn run_experiment(
    results_base: &Path,
    experiment_path: &Path,
    experiment: &ExperimentFile,
    run_index: u32,
) -> Result<RunOutcome> {
    let seed = run_seed(experiment.config.seed, run_index);
    let config = apply_experiment_config(SimConfig::default(), &experiment.config, seed)?;
    let run_name = new_run_name(&experiment.experiment.id);
    info!(seed, run_name = %run_name, "experiment run started");

    let started_at = Utc::now();
    let simulated = run_modes(&config, &experiment.modes);
    let finished_at = Utc::now();

    let (comparison, failure) = match simulated {
        Ok(comparison) => (Some(comparison), None),
        Err(err) => {
            warn!(error = %err, "simulation failed");
            (None, Some(format!("simulation: {err}")))
        }
    };

    debug!("capturing results");
    let capture_input = CaptureInput {
        experiment_id: &experiment.experiment.id,
        experiment_path,
        run_name: &run_name,
        seed,
        modes: &experiment.modes,
        started_at,
        finished_at,
        comparison: comparison.as_ref(),
        failure,
    };
    let results_dir =
        capture_results(results_base, &capture_input).context("capture results")?;

    let judgment = comparison
        .as_ref()
        .map(|comparison| run_checks(&experiment.checks, comparison));
    if let Some(judgment) = &judgment {
        write_judgment(&results_dir.join("checks.json"), judgment).context("write checks")?;
    }

    let outcome = classify_outcome(judgment.as_ref());
    update_outcome(&results_dir, outcome).context("update outcome")?;

    info!(outcome = ?outcome, results_dir = %results_dir.display(), "experiment run complete");

    Ok(RunOutcome {
        run_name,
        seed,
        results_dir,
        outcome,
    })
}
