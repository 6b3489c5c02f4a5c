//! Shared deterministic types for the simulation core.
//!
//! These types define the stable contracts between the engine and the
//! collaborators that consume its records. Field names and order of
//! [`RoundRecord`] are part of the export schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Behavioral type of an agent. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerType {
    /// Contributes near zero every round.
    FreeRider,
    /// Contributes near the full endowment every round.
    #[serde(alias = "cooperator")]
    Altruist,
    /// Tracks the previous round's average contribution.
    Conditional,
}

impl PlayerType {
    pub const ALL: [PlayerType; 3] = [
        PlayerType::FreeRider,
        PlayerType::Altruist,
        PlayerType::Conditional,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerType::FreeRider => "free_rider",
            PlayerType::Altruist => "altruist",
            PlayerType::Conditional => "conditional",
        }
    }
}

impl fmt::Display for PlayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payoff-modifying policy layered on the base game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Governance {
    None,
    Punishment,
    Reward,
}

impl Governance {
    pub const ALL: [Governance; 3] = [Governance::None, Governance::Punishment, Governance::Reward];

    /// Label written into the `governance` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Governance::None => "none",
            Governance::Punishment => "punishment",
            Governance::Reward => "reward",
        }
    }

    /// File stem used for per-mode exports.
    pub fn file_stem(self) -> &'static str {
        match self {
            Governance::None => "no_governance",
            Governance::Punishment => "punishment",
            Governance::Reward => "reward",
        }
    }
}

impl fmt::Display for Governance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Governance {
    type Err = SimError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "none" | "no_governance" | "baseline" => Ok(Governance::None),
            "punishment" | "punish" => Ok(Governance::Punishment),
            "reward" => Ok(Governance::Reward),
            other => Err(SimError::config(format!(
                "unknown governance mode '{other}' (expected none, punishment or reward)"
            ))),
        }
    }
}

/// One agent's outcome for one round. The unit the engine emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: u32,
    pub player_id: u32,
    pub contribution: u32,
    /// Sum of every contribution in this round.
    pub total_pool: u32,
    /// Realized payoff, non-negative and rounded to two decimals.
    pub reward: f64,
    pub governance: Governance,
    pub player_type: PlayerType,
}
