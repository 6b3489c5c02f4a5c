//! Record-level invariants every run must satisfy.
//!
//! Checks return human-readable violations instead of failing fast so that a
//! caller (tests, the lab) can report every problem at once.

use std::collections::BTreeMap;

use crate::core::payoff::{PayoffRule, mean, round_cents};
use crate::core::types::{Governance, RoundRecord};

/// Check structural invariants of a single-mode record list:
/// - `total_pool` equals the round's summed contributions
/// - contributions within `[0, endowment]`
/// - rewards finite and non-negative
/// - exactly `players` records per round, rounds contiguous from 1
pub fn validate_records(records: &[RoundRecord], players: u32, endowment: u32) -> Vec<String> {
    let mut errors = Vec::new();
    let by_round = group_by_round(records);

    for (expected, (&round, rows)) in (1u32..).zip(&by_round) {
        if round != expected {
            errors.push(format!("round {round}: expected round {expected}"));
        }
        if rows.len() != players as usize {
            errors.push(format!(
                "round {round}: {} records, expected {players}",
                rows.len()
            ));
        }
        let sum: u32 = rows.iter().map(|r| r.contribution).sum();
        for row in rows {
            if row.total_pool != sum {
                errors.push(format!(
                    "round {round} player {}: total_pool {} != contributions {sum}",
                    row.player_id, row.total_pool
                ));
            }
        }
    }

    for row in records {
        if row.contribution > endowment {
            errors.push(format!(
                "round {} player {}: contribution {} exceeds endowment {endowment}",
                row.round, row.player_id, row.contribution
            ));
        }
        if !row.reward.is_finite() || row.reward < 0.0 {
            errors.push(format!(
                "round {} player {}: reward {} is negative",
                row.round, row.player_id, row.reward
            ));
        }
    }

    errors
}

/// Every agent strictly below `avg * threshold` must have a zero reward.
pub fn punished_below_threshold(records: &[RoundRecord], rule: &PayoffRule) -> Vec<String> {
    let mut errors = Vec::new();
    for (round, rows) in group_by_round(records) {
        let contributions: Vec<u32> = rows.iter().map(|r| r.contribution).collect();
        let cutoff = mean(&contributions) * rule.punishment_threshold;
        for row in rows {
            if row.governance == Governance::Punishment
                && f64::from(row.contribution) < cutoff
                && row.reward != 0.0
            {
                errors.push(format!(
                    "round {round} player {}: contribution {} below {cutoff:.2} but reward {}",
                    row.player_id, row.contribution, row.reward
                ));
            }
        }
    }
    errors
}

/// Every agent strictly above the average must earn at least the base reward.
pub fn rewarded_above_average(records: &[RoundRecord], rule: &PayoffRule) -> Vec<String> {
    let mut errors = Vec::new();
    for (round, rows) in group_by_round(records) {
        let contributions: Vec<u32> = rows.iter().map(|r| r.contribution).collect();
        let avg = mean(&contributions);
        for row in rows {
            if row.governance != Governance::Reward || f64::from(row.contribution) <= avg {
                continue;
            }
            let base = round_cents(rule.base(row.contribution, row.total_pool).max(0.0));
            if row.reward < base {
                errors.push(format!(
                    "round {round} player {}: reward {} below base {base}",
                    row.player_id, row.reward
                ));
            }
        }
    }
    errors
}

fn group_by_round(records: &[RoundRecord]) -> BTreeMap<u32, Vec<&RoundRecord>> {
    let mut rounds: BTreeMap<u32, Vec<&RoundRecord>> = BTreeMap::new();
    for record in records {
        rounds.entry(record.round).or_default().push(record);
    }
    rounds
}
