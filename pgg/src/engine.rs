//! Canonical game engine: owns a population and drives rounds.
//!
//! ```text
//! Configured --run--> Running(1..=R) --> Complete
//!     ^                                     |
//!     +---------------- reset --------------+
//! ```
//!
//! A run executes all rounds synchronously, so `Running` is only visible
//! through tracing. Calling `run` on a completed engine resets it first, so
//! no governance mode ever reads history left behind by another.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument, warn};

use crate::core::agent::Agent;
use crate::core::population::populate;
use crate::core::round::{GameRules, play_round};
use crate::core::types::{Governance, RoundRecord};
use crate::error::Result;
use crate::io::config::SimConfig;

/// Lifecycle state of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Configured,
    Running { round: u32 },
    Complete { governance: Governance },
}

#[derive(Debug)]
pub struct Engine {
    config: SimConfig,
    rules: GameRules,
    seed: u64,
    rng: StdRng,
    agents: Vec<Agent>,
    history: Vec<RoundRecord>,
    state: EngineState,
}

impl Engine {
    /// Validate `config` and allocate a fresh, typed population.
    ///
    /// Without a configured seed one is drawn from entropy; [`Engine::seed`]
    /// reports it so the run can be reproduced.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        if !config.is_social_dilemma() {
            warn!(
                multiplier = config.multiplier,
                players = config.players,
                "multiplier outside (1, N): no social dilemma"
            );
        }
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let agents = populate(&config.population, config.players, config.endowment, &mut rng);
        debug!(seed, players = agents.len(), "engine configured");
        Ok(Self {
            rules: config.rules(),
            config,
            seed,
            rng,
            agents,
            history: Vec::new(),
            state: EngineState::Configured,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The resolved seed of this engine's random source.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Records accumulated by the latest run.
    pub fn records(&self) -> &[RoundRecord] {
        &self.history
    }

    /// Play every configured round under `governance`.
    #[instrument(skip(self), fields(seed = self.seed))]
    pub fn run(&mut self, governance: Governance) -> &[RoundRecord] {
        if self.state != EngineState::Configured {
            debug!(state = ?self.state, "resetting before run");
            self.reset();
        }

        let rounds = self.config.rounds;
        self.history.reserve(rounds as usize * self.agents.len());
        let mut prev_avg = None;
        for round in 1..=rounds {
            self.state = EngineState::Running { round };
            let outcome = play_round(
                round,
                &mut self.agents,
                prev_avg,
                governance,
                &self.rules,
                &mut self.rng,
            );
            debug!(
                round,
                total_pool = outcome.total_pool,
                average = outcome.average,
                "round complete"
            );
            self.history.extend(outcome.records);
            prev_avg = Some(outcome.average);
        }

        self.state = EngineState::Complete { governance };
        info!(rounds, records = self.history.len(), "run complete");
        &self.history
    }

    /// Return to `Configured`: re-seed the random source, rebuild the same
    /// population from the seed and drop all history.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.agents = populate(
            &self.config.population,
            self.config.players,
            self.config.endowment,
            &mut self.rng,
        );
        self.history.clear();
        self.state = EngineState::Configured;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::test_support::seeded_config;

    #[test]
    fn run_moves_through_states() {
        let mut engine = Engine::new(seeded_config(1, 5)).expect("engine");
        assert_eq!(engine.state(), EngineState::Configured);
        let cohort: Vec<_> = engine.agents().iter().map(|a| (a.id, a.player_type)).collect();
        engine.run(Governance::None);
        assert_eq!(
            engine.state(),
            EngineState::Complete {
                governance: Governance::None
            }
        );
        engine.reset();
        assert_eq!(engine.state(), EngineState::Configured);
        assert!(engine.records().is_empty());
        assert!(engine.agents().iter().all(|a| a.contributions().is_empty()));
        let after: Vec<_> = engine.agents().iter().map(|a| (a.id, a.player_type)).collect();
        assert_eq!(cohort, after);
    }

    #[test]
    fn emits_one_record_per_agent_per_round() {
        let mut engine = Engine::new(seeded_config(2, 7)).expect("engine");
        let records = engine.run(Governance::Reward);
        assert_eq!(records.len(), 70);
        assert_eq!(records.first().map(|r| r.round), Some(1));
        assert_eq!(records.last().map(|r| r.round), Some(7));
        for agent in engine.agents() {
            assert_eq!(agent.contributions().len(), 7);
        }
    }

    #[test]
    fn reset_then_run_matches_fresh_engine() {
        let mut engine = Engine::new(seeded_config(42, 10)).expect("engine");
        engine.run(Governance::Punishment);
        engine.reset();
        let replayed = engine.run(Governance::Punishment).to_vec();

        let mut fresh = Engine::new(seeded_config(42, 10)).expect("fresh");
        assert_eq!(replayed, fresh.run(Governance::Punishment));
    }

    #[test]
    fn second_mode_does_not_see_first_mode_history() {
        let mut engine = Engine::new(seeded_config(8, 6)).expect("engine");
        engine.run(Governance::None);
        let reward = engine.run(Governance::Reward).to_vec();

        let mut fresh = Engine::new(seeded_config(8, 6)).expect("fresh");
        assert_eq!(reward, fresh.run(Governance::Reward));
        for agent in engine.agents() {
            assert_eq!(agent.contributions().len(), 6);
        }
    }

    #[test]
    fn unseeded_engine_reports_reproducible_seed() {
        let mut config = seeded_config(0, 4);
        config.seed = None;
        let mut first = Engine::new(config.clone()).expect("engine");
        let records = first.run(Governance::None).to_vec();

        config.seed = Some(first.seed());
        let mut second = Engine::new(config).expect("engine");
        assert_eq!(records, second.run(Governance::None));
    }

    #[test]
    fn invalid_config_fails_fast() {
        let mut config = seeded_config(1, 5);
        config.players = 0;
        let err = Engine::new(config).expect_err("zero players");
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn pool_overflowing_config_fails_fast() {
        let mut config = seeded_config(1, 2);
        config.endowment = 2_000_000_000;
        let err = Engine::new(config).expect_err("pool overflow");
        assert!(matches!(err, SimError::Config(_)));
    }
}
