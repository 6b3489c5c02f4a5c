//! Fixed type allocation for a population.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::core::agent::Agent;
use crate::core::types::PlayerType;
use crate::error::{Result, SimError};

/// Shares of the population assigned to each extreme type.
///
/// Counts are floored; whatever remains is conditional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationMix {
    pub free_rider_share: f64,
    pub altruist_share: f64,
    /// Shuffle the allocation with the run's seeded source.
    pub shuffle: bool,
}

impl Default for PopulationMix {
    fn default() -> Self {
        Self {
            free_rider_share: 0.2,
            altruist_share: 0.2,
            shuffle: true,
        }
    }
}

impl PopulationMix {
    pub fn validate(&self) -> Result<()> {
        for (name, share) in [
            ("population.free_rider_share", self.free_rider_share),
            ("population.altruist_share", self.altruist_share),
        ] {
            if !(0.0..=1.0).contains(&share) {
                return Err(SimError::config(format!(
                    "{name} must be within [0, 1], got {share}"
                )));
            }
        }
        if self.free_rider_share + self.altruist_share > 1.0 {
            return Err(SimError::config(
                "population shares must not sum to more than 1",
            ));
        }
        Ok(())
    }

    /// Type per seat, in seat order, before any shuffle.
    pub fn allocation(&self, players: u32) -> Vec<PlayerType> {
        let free_riders = share_count(self.free_rider_share, players);
        let altruists = share_count(self.altruist_share, players).min(players - free_riders);
        let conditional = players - free_riders - altruists;

        let mut types = Vec::with_capacity(players as usize);
        types.extend(std::iter::repeat_n(PlayerType::FreeRider, free_riders as usize));
        types.extend(std::iter::repeat_n(PlayerType::Altruist, altruists as usize));
        types.extend(std::iter::repeat_n(PlayerType::Conditional, conditional as usize));
        types
    }
}

/// Build agents `1..=players` with the mix's allocation.
pub fn populate<R: Rng + ?Sized>(
    mix: &PopulationMix,
    players: u32,
    endowment: u32,
    rng: &mut R,
) -> Vec<Agent> {
    let mut types = mix.allocation(players);
    if mix.shuffle {
        types.shuffle(rng);
    }
    types
        .into_iter()
        .zip(1..)
        .map(|(player_type, id)| Agent::new(id, player_type, endowment))
        .collect()
}

fn share_count(share: f64, players: u32) -> u32 {
    (share * f64::from(players)).floor() as u32
}
