//! Test-only helpers for building agents, rules and records.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::core::agent::{Agent, Behavior};
use crate::core::policy::Policy;
use crate::core::round::GameRules;
use crate::core::types::{Governance, PlayerType, RoundRecord};
use crate::io::config::SimConfig;

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random source that always yields zero bits, so every range draw lands on
/// its lower bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinRng;

impl RngCore for MinRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        dest.fill(0);
        Ok(())
    }
}

/// `n` agents with ids `1..=n`, cycling through every player type.
pub fn fixed_agents(n: u32, endowment: u32) -> Vec<Agent> {
    (1..=n)
        .map(|id| {
            let player_type = PlayerType::ALL[(id as usize - 1) % PlayerType::ALL.len()];
            Agent::new(id, player_type, endowment)
        })
        .collect()
}

/// Rules with default behavior and policy and the canonical multiplier.
pub fn rules(players: u32, endowment: u32) -> GameRules {
    GameRules {
        endowment,
        multiplier: 2.0,
        players,
        behavior: Behavior::default(),
        policy: Policy::default(),
    }
}

/// A conditional player's record.
pub fn record(
    round: u32,
    player_id: u32,
    contribution: u32,
    total_pool: u32,
    reward: f64,
    governance: Governance,
) -> RoundRecord {
    RoundRecord {
        round,
        player_id,
        contribution,
        total_pool,
        reward,
        governance,
        player_type: PlayerType::Conditional,
    }
}

/// Default config pinned to `seed` and `rounds`.
pub fn seeded_config(seed: u64, rounds: u32) -> SimConfig {
    SimConfig {
        seed: Some(seed),
        rounds,
        ..SimConfig::default()
    }
}
