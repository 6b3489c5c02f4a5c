//! One round of the game: decide, adapt, clamp, pool, pay, record.

use rand::Rng;

use crate::core::adaptation::adapt;
use crate::core::agent::{Agent, Behavior, clamp_contribution};
use crate::core::payoff::PayoffRule;
use crate::core::policy::Policy;
use crate::core::types::{Governance, RoundRecord};

/// Everything a round needs besides the agents and the random source.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRules {
    pub endowment: u32,
    pub multiplier: f64,
    pub players: u32,
    pub behavior: Behavior,
    pub policy: Policy,
}

impl GameRules {
    pub fn payoff_rule(&self) -> PayoffRule {
        PayoffRule::new(self.endowment, self.multiplier, self.players, &self.policy)
    }
}

/// Output of a single round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    /// One record per agent, in agent order.
    pub records: Vec<RoundRecord>,
    pub total_pool: u32,
    /// `total_pool / N`; the next round's `prev_avg`.
    pub average: f64,
}

/// Play round `round` for every agent and append to each agent's history.
///
/// `prev_avg` is `None` on the first round.
pub fn play_round<R: Rng + ?Sized>(
    round: u32,
    agents: &mut [Agent],
    prev_avg: Option<f64>,
    governance: Governance,
    rules: &GameRules,
    rng: &mut R,
) -> RoundOutcome {
    let contributions: Vec<u32> = agents
        .iter()
        .map(|agent| {
            let raw = agent.decide(round, prev_avg, &rules.behavior, rng);
            let adapted = adapt(
                i64::from(raw),
                agent.player_type,
                governance,
                prev_avg,
                &rules.policy,
            );
            clamp_contribution(adapted, agent.endowment)
        })
        .collect();

    let total_pool: u32 = contributions.iter().sum();
    let average = f64::from(total_pool) / agents.len() as f64;
    let payoff = rules.payoff_rule();

    let records = agents
        .iter_mut()
        .zip(&contributions)
        .map(|(agent, &contribution)| {
            let reward = payoff.payoff(contribution, total_pool, governance, &contributions);
            agent.record(contribution, reward);
            RoundRecord {
                round,
                player_id: agent.id,
                contribution,
                total_pool,
                reward,
                governance,
                player_type: agent.player_type,
            }
        })
        .collect();

    RoundOutcome {
        records,
        total_pool,
        average,
    }
}
