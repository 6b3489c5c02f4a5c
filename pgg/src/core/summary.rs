//! Trend aggregation over emitted records.
//!
//! Groups by `(governance, round)` and `(governance, player_type)`; the shape
//! plotting and reporting collaborators consume.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::payoff::round_cents;
use crate::core::types::{Governance, PlayerType, RoundRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub governance: Governance,
    pub round: u32,
    pub mean_contribution: f64,
    pub mean_reward: f64,
    pub total_pool: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    pub governance: Governance,
    pub player_type: PlayerType,
    pub players: usize,
    pub mean_contribution: f64,
    pub mean_reward: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSummary {
    pub governance: Governance,
    pub rounds: u32,
    pub opening_mean_contribution: f64,
    pub final_mean_contribution: f64,
    pub mean_contribution: f64,
    pub mean_reward: f64,
    /// Records whose reward is exactly zero.
    pub zero_rewards: usize,
}

impl ModeSummary {
    /// Direction of the mean contribution from the opening to the final round.
    pub fn direction(&self) -> Direction {
        let delta = self.final_mean_contribution - self.opening_mean_contribution;
        if delta > 0.5 {
            Direction::Rising
        } else if delta < -0.5 {
            Direction::Declining
        } else {
            Direction::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Rising,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub modes: Vec<ModeSummary>,
    pub trends: Vec<TrendPoint>,
    pub by_type: Vec<TypeBreakdown>,
}

impl TrendSummary {
    pub fn mode(&self, governance: Governance) -> Option<&ModeSummary> {
        self.modes.iter().find(|mode| mode.governance == governance)
    }
}

#[derive(Default)]
struct Acc {
    count: usize,
    contribution: f64,
    reward: f64,
    pool: u32,
    zero_rewards: usize,
}

impl Acc {
    fn push(&mut self, record: &RoundRecord) {
        self.count += 1;
        self.contribution += f64::from(record.contribution);
        self.reward += record.reward;
        self.pool = record.total_pool;
        if record.reward == 0.0 {
            self.zero_rewards += 1;
        }
    }

    fn mean_contribution(&self) -> f64 {
        round_cents(self.contribution / self.count.max(1) as f64)
    }

    fn mean_reward(&self) -> f64 {
        round_cents(self.reward / self.count.max(1) as f64)
    }
}

/// Summarize records from any number of governance modes.
pub fn summarize(records: &[RoundRecord]) -> TrendSummary {
    let mut per_round: BTreeMap<(Governance, u32), Acc> = BTreeMap::new();
    let mut per_type: BTreeMap<(Governance, PlayerType), (Acc, Vec<u32>)> = BTreeMap::new();
    let mut per_mode: BTreeMap<Governance, Acc> = BTreeMap::new();

    for record in records {
        per_round
            .entry((record.governance, record.round))
            .or_default()
            .push(record);
        let (acc, ids) = per_type
            .entry((record.governance, record.player_type))
            .or_default();
        acc.push(record);
        if !ids.contains(&record.player_id) {
            ids.push(record.player_id);
        }
        per_mode.entry(record.governance).or_default().push(record);
    }

    let trends: Vec<TrendPoint> = per_round
        .iter()
        .map(|(&(governance, round), acc)| TrendPoint {
            governance,
            round,
            mean_contribution: acc.mean_contribution(),
            mean_reward: acc.mean_reward(),
            total_pool: acc.pool,
        })
        .collect();

    let by_type = per_type
        .iter()
        .map(|(&(governance, player_type), (acc, ids))| TypeBreakdown {
            governance,
            player_type,
            players: ids.len(),
            mean_contribution: acc.mean_contribution(),
            mean_reward: acc.mean_reward(),
        })
        .collect();

    let modes = per_mode
        .iter()
        .map(|(&governance, acc)| {
            let mut points = trends.iter().filter(|p| p.governance == governance);
            let opening = points.next();
            let last = points.last().or(opening);
            ModeSummary {
                governance,
                rounds: last.map_or(0, |p| p.round),
                opening_mean_contribution: opening.map_or(0.0, |p| p.mean_contribution),
                final_mean_contribution: last.map_or(0.0, |p| p.mean_contribution),
                mean_contribution: acc.mean_contribution(),
                mean_reward: acc.mean_reward(),
                zero_rewards: acc.zero_rewards,
            }
        })
        .collect();

    TrendSummary {
        modes,
        trends,
        by_type,
    }
}
