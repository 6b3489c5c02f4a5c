//! Check execution and outcome recording.
//!
//! Runs an experiment's checks against the records of every mode and records
//! a detailed outcome per check.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use pgg::compare::{Comparison, ModeRun};
use pgg::core::invariants::{punished_below_threshold, rewarded_above_average};
use pgg::core::payoff::mean;
use pgg::core::types::{Governance, PlayerType, RoundRecord};

use crate::experiment::Check;

/// Violations kept per check; the rest are counted but not stored.
pub const VIOLATION_LIMIT: usize = 20;

/// Collected check outcomes for a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct Judgment {
    pub checks: Vec<CheckOutcome>,
}

impl Judgment {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(CheckOutcome::passed)
    }
}

/// Result of running a single check.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckOutcome {
    PoolMatchesContributions(Violations),
    ContributionsInBounds(Violations),
    RewardsNonNegative(Violations),
    PunishmentZeroesDefectors(Violations),
    RewardNotBelowBase(Violations),
    GovernanceLiftsContribution {
        governance: Governance,
        passed: bool,
        baseline_mean: Option<f64>,
        governed_mean: Option<f64>,
    },
    IdenticalCohorts {
        passed: bool,
        modes: usize,
        mismatched: Vec<Governance>,
    },
}

/// Pass/fail plus a bounded sample of what went wrong.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violations {
    pub passed: bool,
    pub count: usize,
    pub samples: Vec<String>,
    pub truncated: bool,
}

impl Violations {
    fn from_errors(mut errors: Vec<String>) -> Self {
        let count = errors.len();
        let truncated = count > VIOLATION_LIMIT;
        errors.truncate(VIOLATION_LIMIT);
        Self {
            passed: count == 0,
            count,
            samples: errors,
            truncated,
        }
    }
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        match self {
            CheckOutcome::PoolMatchesContributions(v)
            | CheckOutcome::ContributionsInBounds(v)
            | CheckOutcome::RewardsNonNegative(v)
            | CheckOutcome::PunishmentZeroesDefectors(v)
            | CheckOutcome::RewardNotBelowBase(v) => v.passed,
            CheckOutcome::GovernanceLiftsContribution { passed, .. } => *passed,
            CheckOutcome::IdenticalCohorts { passed, .. } => *passed,
        }
    }

    /// Stable label used when aggregating pass rates.
    pub fn label(&self) -> String {
        match self {
            CheckOutcome::PoolMatchesContributions(_) => "pool_matches_contributions".to_string(),
            CheckOutcome::ContributionsInBounds(_) => "contributions_in_bounds".to_string(),
            CheckOutcome::RewardsNonNegative(_) => "rewards_non_negative".to_string(),
            CheckOutcome::PunishmentZeroesDefectors(_) => {
                "punishment_zeroes_defectors".to_string()
            }
            CheckOutcome::RewardNotBelowBase(_) => "reward_not_below_base".to_string(),
            CheckOutcome::GovernanceLiftsContribution { governance, .. } => {
                format!("governance_lifts_contribution({governance})")
            }
            CheckOutcome::IdenticalCohorts { .. } => "identical_cohorts".to_string(),
        }
    }
}

/// Run all checks against a finished comparison.
#[instrument(skip_all, fields(check_count = checks.len()))]
pub fn run_checks(checks: &[Check], comparison: &Comparison) -> Judgment {
    let config = &comparison.config;
    let rule = config.rules().payoff_rule();
    let mut outcomes = Vec::with_capacity(checks.len());
    for check in checks {
        let outcome = match check {
            Check::PoolMatchesContributions => CheckOutcome::PoolMatchesContributions(
                Violations::from_errors(each_run(comparison, pool_errors)),
            ),
            Check::ContributionsInBounds => {
                let endowment = config.endowment;
                CheckOutcome::ContributionsInBounds(Violations::from_errors(each_run(
                    comparison,
                    |records| bound_errors(records, endowment),
                )))
            }
            Check::RewardsNonNegative => CheckOutcome::RewardsNonNegative(
                Violations::from_errors(each_run(comparison, reward_errors)),
            ),
            Check::PunishmentZeroesDefectors => {
                CheckOutcome::PunishmentZeroesDefectors(Violations::from_errors(
                    mode_errors(comparison, Governance::Punishment, |records| {
                        punished_below_threshold(records, &rule)
                    }),
                ))
            }
            Check::RewardNotBelowBase => CheckOutcome::RewardNotBelowBase(
                Violations::from_errors(mode_errors(comparison, Governance::Reward, |records| {
                    rewarded_above_average(records, &rule)
                })),
            ),
            Check::GovernanceLiftsContribution { governance } => {
                let baseline_mean = mean_contribution(comparison.run(Governance::None));
                let governed_mean = mean_contribution(comparison.run(*governance));
                let passed = matches!(
                    (baseline_mean, governed_mean),
                    (Some(baseline), Some(governed)) if governed >= baseline
                );
                CheckOutcome::GovernanceLiftsContribution {
                    governance: *governance,
                    passed,
                    baseline_mean,
                    governed_mean,
                }
            }
            Check::IdenticalCohorts => {
                let mismatched = cohort_mismatches(&comparison.runs);
                CheckOutcome::IdenticalCohorts {
                    passed: mismatched.is_empty() && comparison.runs.len() > 1,
                    modes: comparison.runs.len(),
                    mismatched,
                }
            }
        };
        if outcome.passed() {
            debug!(check = %outcome.label(), "check passed");
        } else {
            warn!(check = %outcome.label(), "check failed");
        }
        outcomes.push(outcome);
    }
    Judgment { checks: outcomes }
}

pub fn write_judgment(path: &Path, judgment: &Judgment) -> Result<()> {
    let contents = serde_json::to_string_pretty(judgment).context("serialize checks")?;
    fs::write(path, format!("{contents}\n"))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn each_run(comparison: &Comparison, check: impl Fn(&[RoundRecord]) -> Vec<String>) -> Vec<String> {
    comparison
        .runs
        .iter()
        .flat_map(|run| {
            check(&run.records)
                .into_iter()
                .map(move |err| format!("{}: {err}", run.governance))
        })
        .collect()
}

fn mode_errors(
    comparison: &Comparison,
    governance: Governance,
    check: impl Fn(&[RoundRecord]) -> Vec<String>,
) -> Vec<String> {
    match comparison.run(governance) {
        Some(run) => check(&run.records),
        None => vec![format!("mode {governance} was not run")],
    }
}

fn pool_errors(records: &[RoundRecord]) -> Vec<String> {
    let mut sums: BTreeMap<u32, u32> = BTreeMap::new();
    for record in records {
        *sums.entry(record.round).or_default() += record.contribution;
    }
    records
        .iter()
        .filter(|r| sums.get(&r.round) != Some(&r.total_pool))
        .map(|r| {
            format!(
                "round {} player {}: total_pool {} != contributions {}",
                r.round,
                r.player_id,
                r.total_pool,
                sums.get(&r.round).copied().unwrap_or_default()
            )
        })
        .collect()
}

fn bound_errors(records: &[RoundRecord], endowment: u32) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.contribution > endowment)
        .map(|r| {
            format!(
                "round {} player {}: contribution {} exceeds {endowment}",
                r.round, r.player_id, r.contribution
            )
        })
        .collect()
}

fn reward_errors(records: &[RoundRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|r| !r.reward.is_finite() || r.reward < 0.0)
        .map(|r| format!("round {} player {}: reward {}", r.round, r.player_id, r.reward))
        .collect()
}

fn mean_contribution(run: Option<&ModeRun>) -> Option<f64> {
    let run = run?;
    let contributions: Vec<u32> = run.records.iter().map(|r| r.contribution).collect();
    (!contributions.is_empty()).then(|| mean(&contributions))
}

fn cohort_mismatches(runs: &[ModeRun]) -> Vec<Governance> {
    let key = |run: &ModeRun| -> Vec<(u32, u32, PlayerType)> {
        run.records
            .iter()
            .map(|r| (r.round, r.player_id, r.player_type))
            .collect()
    };
    let Some((first, rest)) = runs.split_first() else {
        return Vec::new();
    };
    let baseline = key(first);
    rest.iter()
        .filter(|run| key(run) != baseline)
        .map(|run| run.governance)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgg::compare::run_modes;
    use pgg::io::config::SimConfig;

    fn comparison(modes: &[Governance]) -> Comparison {
        let config = SimConfig {
            seed: Some(17),
            rounds: 6,
            ..SimConfig::default()
        };
        run_modes(&config, modes).expect("comparison")
    }

    #[test]
    fn engine_output_passes_structural_checks() {
        let comparison = comparison(&Governance::ALL);
        let checks = vec![
            Check::PoolMatchesContributions,
            Check::ContributionsInBounds,
            Check::RewardsNonNegative,
            Check::PunishmentZeroesDefectors,
            Check::RewardNotBelowBase,
            Check::IdenticalCohorts,
        ];
        let judgment = run_checks(&checks, &comparison);
        assert_eq!(judgment.checks.len(), 6);
        for outcome in &judgment.checks {
            assert!(outcome.passed(), "{} failed: {outcome:?}", outcome.label());
        }
        assert!(judgment.all_passed());
    }

    #[test]
    fn tampered_pool_is_reported() {
        let mut comparison = comparison(&[Governance::None]);
        comparison.runs[0].records[0].total_pool += 1;

        let judgment = run_checks(&[Check::PoolMatchesContributions], &comparison);
        match &judgment.checks[0] {
            CheckOutcome::PoolMatchesContributions(v) => {
                assert!(!v.passed);
                assert_eq!(v.count, 1);
                assert!(v.samples[0].starts_with("none: round 1"));
            }
            other => panic!("expected pool_matches_contributions, got {other:?}"),
        }
    }

    #[test]
    fn violations_are_truncated() {
        let errors: Vec<String> = (0..VIOLATION_LIMIT + 5).map(|i| i.to_string()).collect();
        let violations = Violations::from_errors(errors);
        assert!(!violations.passed);
        assert!(violations.truncated);
        assert_eq!(violations.count, VIOLATION_LIMIT + 5);
        assert_eq!(violations.samples.len(), VIOLATION_LIMIT);
    }

    #[test]
    fn lift_compares_against_baseline() {
        let mut comparison = comparison(&[Governance::None, Governance::Reward]);
        for record in &mut comparison.runs[1].records {
            record.contribution = 10;
        }
        let judgment = run_checks(
            &[Check::GovernanceLiftsContribution {
                governance: Governance::Reward,
            }],
            &comparison,
        );
        match &judgment.checks[0] {
            CheckOutcome::GovernanceLiftsContribution {
                passed,
                governed_mean,
                ..
            } => {
                assert!(*passed);
                assert_eq!(*governed_mean, Some(10.0));
            }
            other => panic!("expected governance_lifts_contribution, got {other:?}"),
        }
    }

    #[test]
    fn cohort_mismatch_names_the_mode() {
        let mut comparison = comparison(&[Governance::None, Governance::Punishment]);
        comparison.runs[1].records[0].player_id = 99;
        let judgment = run_checks(&[Check::IdenticalCohorts], &comparison);
        match &judgment.checks[0] {
            CheckOutcome::IdenticalCohorts {
                passed, mismatched, ..
            } => {
                assert!(!*passed);
                assert_eq!(mismatched, &vec![Governance::Punishment]);
            }
            other => panic!("expected identical_cohorts, got {other:?}"),
        }
    }
}
