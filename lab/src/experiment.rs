//! Experiment file parsing and validation.
//!
//! Experiments are TOML files naming a configuration, the governance modes to
//! run and the checks every run must pass. See `lab/experiments/` for examples.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use pgg::core::types::Governance;

/// A parsed experiment file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExperimentFile {
    /// Modes played by every run, each from a fresh engine.
    #[serde(default = "all_modes")]
    pub modes: Vec<Governance>,
    pub experiment: ExperimentMeta,
    #[serde(default)]
    pub config: ExperimentConfig,
    #[serde(default)]
    pub checks: Vec<Check>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExperimentMeta {
    /// Unique identifier (slug format: `[a-z0-9_-]+`).
    pub id: String,
    pub description: String,
}

/// Overrides applied on top of the default simulation config.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ExperimentConfig {
    pub players: Option<i64>,
    pub endowment: Option<i64>,
    pub multiplier: Option<f64>,
    pub rounds: Option<i64>,
    /// Base seed; run `i` uses `seed + i`.
    pub seed: Option<u64>,
}

/// Verification applied to the records of a run.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Check {
    /// Every record's `total_pool` equals its round's summed contributions.
    PoolMatchesContributions,
    /// Every contribution lies in `[0, endowment]`.
    ContributionsInBounds,
    RewardsNonNegative,
    /// Under punishment, contributors below the threshold earn nothing.
    PunishmentZeroesDefectors,
    /// Under reward, above-average contributors earn at least the base payoff.
    RewardNotBelowBase,
    /// Mean contribution under `governance` is at least the ungoverned mean.
    GovernanceLiftsContribution { governance: Governance },
    /// All modes saw the same ids, types and rounds.
    IdenticalCohorts,
}

impl Check {
    /// Stable label used in reports.
    pub fn label(&self) -> String {
        match self {
            Check::PoolMatchesContributions => "pool_matches_contributions".to_string(),
            Check::ContributionsInBounds => "contributions_in_bounds".to_string(),
            Check::RewardsNonNegative => "rewards_non_negative".to_string(),
            Check::PunishmentZeroesDefectors => "punishment_zeroes_defectors".to_string(),
            Check::RewardNotBelowBase => "reward_not_below_base".to_string(),
            Check::GovernanceLiftsContribution { governance } => {
                format!("governance_lifts_contribution({governance})")
            }
            Check::IdenticalCohorts => "identical_cohorts".to_string(),
        }
    }

    fn validate(&self, modes: &[Governance]) -> Result<()> {
        let require = |mode: Governance| {
            if modes.contains(&mode) {
                Ok(())
            } else {
                Err(anyhow!("{} requires mode {mode} in modes", self.label()))
            }
        };
        match self {
            Check::PunishmentZeroesDefectors => require(Governance::Punishment),
            Check::RewardNotBelowBase => require(Governance::Reward),
            Check::GovernanceLiftsContribution { governance } => {
                if *governance == Governance::None {
                    bail!("governance_lifts_contribution.governance must not be none");
                }
                require(Governance::None)?;
                require(*governance)
            }
            Check::IdenticalCohorts if modes.len() < 2 => {
                bail!("identical_cohorts requires at least two modes")
            }
            _ => Ok(()),
        }
    }
}

impl ExperimentFile {
    /// Load and validate an experiment file from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read experiment {}", path.display()))?;
        let experiment: ExperimentFile = toml::from_str(&contents)
            .with_context(|| format!("parse experiment {}", path.display()))?;
        experiment
            .validate()
            .with_context(|| format!("validate experiment {}", path.display()))?;
        Ok(experiment)
    }

    #[cfg(test)]
    pub fn parse_str(contents: &str) -> Result<Self> {
        let experiment: ExperimentFile = toml::from_str(contents).context("parse experiment")?;
        experiment.validate()?;
        Ok(experiment)
    }

    fn validate(&self) -> Result<()> {
        validate_experiment_id(&self.experiment.id)?;
        if self.experiment.description.trim().is_empty() {
            bail!("experiment.description must be non-empty");
        }
        if self.modes.is_empty() {
            bail!("modes must be a non-empty array");
        }
        for (index, mode) in self.modes.iter().enumerate() {
            if self.modes[..index].contains(mode) {
                bail!("modes lists {mode} more than once");
            }
        }
        if self.checks.is_empty() {
            bail!("checks must be a non-empty array");
        }
        for (index, check) in self.checks.iter().enumerate() {
            check
                .validate(&self.modes)
                .with_context(|| format!("checks[{index}] invalid"))?;
        }
        Ok(())
    }
}

/// Discover and load all experiment files from a directory.
///
/// Returns experiments sorted by id. Errors if duplicate ids are found.
pub fn discover_experiments(dir: &Path) -> Result<Vec<ExperimentFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut experiments = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("read experiments dir {}", dir.display()))?
    {
        let entry = entry.context("read experiment entry")?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            continue;
        }
        experiments.push(ExperimentFile::load(&path)?);
    }
    experiments.sort_by(|left, right| left.experiment.id.cmp(&right.experiment.id));
    for pair in experiments.windows(2) {
        if pair[0].experiment.id == pair[1].experiment.id {
            return Err(anyhow!("duplicate experiment.id {}", pair[0].experiment.id));
        }
    }
    Ok(experiments)
}

pub fn validate_experiment_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        bail!("experiment.id must be non-empty");
    }
    if id.contains('/') || id.contains('\\') {
        bail!("experiment.id must not contain path separators");
    }
    if id.contains("..") {
        bail!("experiment.id must not contain '..'");
    }
    if !id
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
    {
        bail!("experiment.id must use [a-z0-9_-] only");
    }
    Ok(())
}

fn all_modes() -> Vec<Governance> {
    Governance::ALL.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_experiment() {
        let input = r#"
modes = ["none", "reward"]

[experiment]
id = "small-group"
description = "four players, reward only"

[config]
players = 4
rounds = 6
seed = 11

[[checks]]
type = "pool_matches_contributions"

[[checks]]
type = "governance_lifts_contribution"
governance = "reward"

[[checks]]
type = "identical_cohorts"
"#;
        let experiment = ExperimentFile::parse_str(input).expect("experiment parses");
        assert_eq!(experiment.experiment.id, "small-group");
        assert_eq!(experiment.modes, vec![Governance::None, Governance::Reward]);
        assert_eq!(experiment.config.players, Some(4));
        assert_eq!(experiment.checks.len(), 3);
        assert_eq!(
            experiment.checks[1].label(),
            "governance_lifts_contribution(reward)"
        );
    }

    #[test]
    fn modes_default_to_all_three() {
        let input = r#"
[experiment]
id = "defaults"
description = "d"

[[checks]]
type = "rewards_non_negative"
"#;
        let experiment = ExperimentFile::parse_str(input).expect("experiment parses");
        assert_eq!(experiment.modes, Governance::ALL.to_vec());
        assert_eq!(experiment.config, ExperimentConfig::default());
    }

    #[test]
    fn rejects_invalid_id() {
        let input = r#"
[experiment]
id = "bad/id"
description = "d"

[[checks]]
type = "rewards_non_negative"
"#;
        let err = ExperimentFile::parse_str(input).expect_err("invalid id");
        assert!(err.to_string().contains("experiment.id"));
    }

    #[test]
    fn rejects_check_for_mode_that_is_not_run() {
        let input = r#"
modes = ["none"]

[experiment]
id = "baseline"
description = "d"

[[checks]]
type = "punishment_zeroes_defectors"
"#;
        let err = ExperimentFile::parse_str(input).expect_err("missing mode");
        assert!(format!("{err:#}").contains("punishment"));
    }

    #[test]
    fn rejects_unknown_mode() {
        let input = r#"
modes = ["anarchy"]

[experiment]
id = "x"
description = "d"

[[checks]]
type = "rewards_non_negative"
"#;
        let _err = ExperimentFile::parse_str(input).expect_err("unknown mode");
    }

    #[test]
    fn discovers_sorted_experiments() {
        let temp = tempfile::tempdir().expect("tempdir");
        for id in ["zeta", "alpha"] {
            let contents = format!(
                "[experiment]\nid = \"{id}\"\ndescription = \"d\"\n\n[[checks]]\ntype = \"rewards_non_negative\"\n"
            );
            fs::write(temp.path().join(format!("{id}.toml")), contents).expect("write");
        }
        fs::write(temp.path().join("notes.md"), "ignored").expect("write notes");

        let experiments = discover_experiments(temp.path()).expect("discover");
        let ids: Vec<&str> = experiments
            .iter()
            .map(|e| e.experiment.id.as_str())
            .collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }
}
