//! Simulation configuration merging.
//!
//! Applies experiment overrides and the per-run seed to a base config.

use anyhow::{Context, Result};
use pgg::io::config::{ConfigOverrides, SimConfig};

use crate::experiment::ExperimentConfig;

/// Seed for the zero-based `run_index`: `base + run_index` when the
/// experiment pins a seed, fresh entropy otherwise.
pub fn run_seed(base: Option<u64>, run_index: u32) -> u64 {
    match base {
        Some(seed) => seed.wrapping_add(u64::from(run_index)),
        None => rand::random(),
    }
}

/// Apply experiment overrides to `base` and pin the run's seed.
pub fn apply_experiment_config(
    base: SimConfig,
    overrides: &ExperimentConfig,
    seed: u64,
) -> Result<SimConfig> {
    let overrides = ConfigOverrides {
        players: overrides.players,
        endowment: overrides.endowment,
        multiplier: overrides.multiplier,
        rounds: overrides.rounds,
        seed: Some(seed),
        governance: None,
    };
    base.apply(&overrides).context("apply experiment config")
}
