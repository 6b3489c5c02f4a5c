//! CLI command implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::experiment::{ExperimentFile, discover_experiments, validate_experiment_id};
use crate::report::aggregate;
use crate::run::run_experiment;

fn experiments_dir(repo_root: &Path) -> PathBuf {
    repo_root.join("lab").join("experiments")
}

fn results_base(repo_root: &Path) -> PathBuf {
    repo_root.join("lab").join("results")
}

/// List all available experiments.
pub fn list_experiments(repo_root: &Path) -> Result<()> {
    for experiment in discover_experiments(&experiments_dir(repo_root))? {
        println!(
            "{}\t{}",
            experiment.experiment.id, experiment.experiment.description
        );
    }
    Ok(())
}

/// Run an experiment by id (optionally multiple times).
pub fn run_experiment_by_id(repo_root: &Path, experiment_id: &str, runs: u32) -> Result<()> {
    validate_experiment_id(experiment_id)?;
    let experiment_path = experiments_dir(repo_root).join(format!("{experiment_id}.toml"));
    if !experiment_path.exists() {
        bail!(
            "experiment {} not found at {}",
            experiment_id,
            experiment_path.display()
        );
    }
    let experiment = ExperimentFile::load(&experiment_path).context("load experiment")?;
    debug!(experiment_id, runs, "experiment loaded");

    info!(experiment_id, runs, "starting runs");
    let results_base = results_base(repo_root);
    for run_index in 0..runs {
        let outcome = run_experiment(&results_base, &experiment_path, &experiment, run_index)
            .context("run experiment")?;
        println!(
            "run: experiment={} run={} seed={} outcome={:?} results={}",
            experiment_id,
            outcome.run_name,
            outcome.seed,
            outcome.outcome,
            outcome.results_dir.display()
        );
    }
    Ok(())
}

/// Show aggregated results for an experiment.
pub fn report_experiment(repo_root: &Path, experiment_id: &str) -> Result<()> {
    validate_experiment_id(experiment_id)?;
    let (summary, warnings) = aggregate(&results_base(repo_root).join(experiment_id))?;
    println!("report: experiment={} runs={}", experiment_id, summary.runs);
    println!(
        "report: pass={} fail={} error={}",
        summary.pass, summary.fail, summary.error
    );
    if let Some(avg) = summary.avg_duration_secs {
        println!("report: avg_duration_secs={:.3}", avg);
    }
    for (label, (passed, total)) in &summary.check_pass_rates {
        println!("report: check {} {}/{}", label, passed, total);
    }
    for (mode, mean) in summary.mean_final_contribution() {
        println!("report: final_mean_contribution {} {:.2}", mode, mean);
    }
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

/// Remove all results for an experiment.
pub fn clean_experiment(repo_root: &Path, experiment_id: &str) -> Result<()> {
    validate_experiment_id(experiment_id)?;
    let experiment_results = results_base(repo_root).join(experiment_id);
    if experiment_results.exists() {
        std::fs::remove_dir_all(&experiment_results)
            .with_context(|| format!("remove {}", experiment_results.display()))?;
    }
    println!(
        "clean: experiment={} results={}",
        experiment_id,
        experiment_results.display()
    );
    Ok(())
}
