//! Markdown report rendered from a trend summary.

use std::fs;
use std::path::Path;

use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::summary::{Direction, TrendSummary};
use crate::error::{Result, SimError};
use crate::io::config::SimConfig;

const REPORT_TEMPLATE: &str = include_str!("templates/report.md");

#[derive(Debug, Clone, Serialize)]
struct ModeContext {
    label: &'static str,
    rounds: u32,
    opening: f64,
    #[serde(rename = "final")]
    final_mean: f64,
    direction: &'static str,
    mean_contribution: f64,
    mean_reward: f64,
    zero_rewards: usize,
}

/// Render the report for a summary produced from runs of `config` with `seed`.
pub fn render_report(config: &SimConfig, seed: u64, summary: &TrendSummary) -> Result<String> {
    let modes: Vec<ModeContext> = summary
        .modes
        .iter()
        .map(|mode| ModeContext {
            label: mode.governance.as_str(),
            rounds: mode.rounds,
            opening: mode.opening_mean_contribution,
            final_mean: mode.final_mean_contribution,
            direction: match mode.direction() {
                Direction::Rising => "rising",
                Direction::Declining => "declining",
                Direction::Stable => "stable",
            },
            mean_contribution: mode.mean_contribution,
            mean_reward: mode.mean_reward,
            zero_rewards: mode.zero_rewards,
        })
        .collect();

    let mut env = Environment::new();
    env.add_template("report", REPORT_TEMPLATE)?;
    let rendered = env.get_template("report")?.render(context! {
        players => config.players,
        endowment => config.endowment,
        multiplier => config.multiplier,
        rounds => config.rounds,
        seed => seed,
        dilemma => config.is_social_dilemma(),
        punishment_threshold => config.policy.punishment_threshold,
        reward_bonus => config.policy.reward_bonus,
        modes => modes,
        by_type => &summary.by_type,
    })?;
    Ok(rendered)
}

pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|err| SimError::io(path, err))
}
