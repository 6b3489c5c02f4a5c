//! Agent state and per-type contribution rules.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::PlayerType;
use crate::error::{Result, SimError};

/// Tunable parameters of the per-type decision heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Behavior {
    /// Magnitude of the per-decision noise, drawn uniformly from `[-noise, noise]`.
    pub noise: u32,
    /// Free riders open round 1 with a draw from `[0, free_rider_opening_max]`.
    pub free_rider_opening_max: u32,
    /// Altruists open round 1 with a draw from `[floor(ratio * E), E]`.
    pub altruist_opening_ratio: f64,
    /// Conditional agents open round 1 inside `[floor(min * E), floor(max * E))`.
    pub conditional_opening_min_ratio: f64,
    pub conditional_opening_max_ratio: f64,
    /// When set, conditional agents decay after this round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatigue_after_round: Option<u32>,
    /// Upper bound of the fatigue decay, drawn uniformly from `[0, max]`.
    pub fatigue_max_decay: u32,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            noise: 1,
            free_rider_opening_max: 2,
            altruist_opening_ratio: 0.8,
            conditional_opening_min_ratio: 0.4,
            conditional_opening_max_ratio: 0.7,
            fatigue_after_round: None,
            fatigue_max_decay: 2,
        }
    }
}

impl Behavior {
    pub fn validate(&self) -> Result<()> {
        for (name, ratio) in [
            ("behavior.altruist_opening_ratio", self.altruist_opening_ratio),
            (
                "behavior.conditional_opening_min_ratio",
                self.conditional_opening_min_ratio,
            ),
            (
                "behavior.conditional_opening_max_ratio",
                self.conditional_opening_max_ratio,
            ),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(SimError::config(format!(
                    "{name} must be within [0, 1], got {ratio}"
                )));
            }
        }
        if self.conditional_opening_min_ratio > self.conditional_opening_max_ratio {
            return Err(SimError::config(
                "behavior.conditional_opening_min_ratio must not exceed conditional_opening_max_ratio",
            ));
        }
        Ok(())
    }
}

/// Uniform integer noise over `[-magnitude, magnitude]`.
///
/// Every decision call draws from exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Noise {
    magnitude: i64,
}

impl Noise {
    pub fn new(magnitude: u32) -> Self {
        Self {
            magnitude: i64::from(magnitude),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        if self.magnitude == 0 {
            return 0;
        }
        rng.gen_range(-self.magnitude..=self.magnitude)
    }
}

/// A player with a fixed type and its exclusively owned history.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: u32,
    pub player_type: PlayerType,
    pub endowment: u32,
    contributions: Vec<u32>,
    rewards: Vec<f64>,
}

impl Agent {
    pub fn new(id: u32, player_type: PlayerType, endowment: u32) -> Self {
        Self {
            id,
            player_type,
            endowment,
            contributions: Vec::new(),
            rewards: Vec::new(),
        }
    }

    pub fn contributions(&self) -> &[u32] {
        &self.contributions
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Decide this round's contribution, always within `[0, endowment]`.
    ///
    /// `prev_avg` is the previous round's average contribution; `None` means no
    /// round has been observed yet and the type's opening band is used instead.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        round: u32,
        prev_avg: Option<f64>,
        behavior: &Behavior,
        rng: &mut R,
    ) -> u32 {
        let mut raw = match prev_avg {
            None => self.opening(behavior, rng),
            Some(avg) => self.follow_up(avg, behavior, rng),
        };
        if self.player_type == PlayerType::Conditional
            && behavior
                .fatigue_after_round
                .is_some_and(|threshold| round > threshold)
        {
            raw -= rng.gen_range(0..=i64::from(behavior.fatigue_max_decay));
        }
        clamp_contribution(raw, self.endowment)
    }

    /// Append one round of history.
    pub fn record(&mut self, contribution: u32, reward: f64) {
        self.contributions.push(contribution);
        self.rewards.push(reward);
    }

    /// Empty both histories; identity, type and endowment are kept.
    pub fn reset(&mut self) {
        self.contributions.clear();
        self.rewards.clear();
    }

    fn opening<R: Rng + ?Sized>(&self, behavior: &Behavior, rng: &mut R) -> i64 {
        let endowment = i64::from(self.endowment);
        match self.player_type {
            PlayerType::FreeRider => {
                rng.gen_range(0..=i64::from(behavior.free_rider_opening_max).min(endowment))
            }
            PlayerType::Altruist => {
                let low = scaled(behavior.altruist_opening_ratio, self.endowment);
                rng.gen_range(low..=endowment)
            }
            PlayerType::Conditional => {
                let low = scaled(behavior.conditional_opening_min_ratio, self.endowment);
                let high = scaled(behavior.conditional_opening_max_ratio, self.endowment);
                if high > low {
                    rng.gen_range(low..high)
                } else {
                    low
                }
            }
        }
    }

    fn follow_up<R: Rng + ?Sized>(&self, prev_avg: f64, behavior: &Behavior, rng: &mut R) -> i64 {
        let noise = Noise::new(behavior.noise).sample(rng);
        match self.player_type {
            PlayerType::FreeRider => noise.max(0),
            PlayerType::Altruist => i64::from(self.endowment) + noise.min(0),
            PlayerType::Conditional => prev_avg.floor() as i64 + noise,
        }
    }
}

/// Clamp a raw decision into `[0, endowment]`.
pub fn clamp_contribution(raw: i64, endowment: u32) -> u32 {
    raw.clamp(0, i64::from(endowment)) as u32
}

fn scaled(ratio: f64, endowment: u32) -> i64 {
    (ratio * f64::from(endowment)).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MinRng, seeded_rng};

    #[test]
    fn free_rider_stays_near_floor() {
        let agent = Agent::new(1, PlayerType::FreeRider, 10);
        let behavior = Behavior::default();
        let mut rng = seeded_rng(3);
        for round in 1..=50 {
            let prev = (round > 1).then_some(7.5);
            let c = agent.decide(round, prev, &behavior, &mut rng);
            assert!(c <= 2, "round {round}: {c}");
        }
    }

    #[test]
    fn altruist_stays_near_ceiling() {
        let agent = Agent::new(2, PlayerType::Altruist, 10);
        let behavior = Behavior::default();
        let mut rng = seeded_rng(4);
        assert!(agent.decide(1, None, &behavior, &mut rng) >= 8);
        for round in 2..=50 {
            let c = agent.decide(round, Some(1.0), &behavior, &mut rng);
            assert!((9..=10).contains(&c), "round {round}: {c}");
        }
    }

    #[test]
    fn conditional_opens_mid_range_and_then_tracks_average() {
        let agent = Agent::new(3, PlayerType::Conditional, 10);
        let behavior = Behavior::default();
        let mut rng = seeded_rng(5);
        for _ in 0..50 {
            let opening = agent.decide(1, None, &behavior, &mut rng);
            assert!((4..7).contains(&opening), "opening {opening}");
            let tracked = agent.decide(2, Some(6.9), &behavior, &mut rng);
            assert!((5..=7).contains(&tracked), "tracked {tracked}");
        }
    }

    #[test]
    fn free_rider_with_minimum_draws_clamps_to_zero() {
        let agent = Agent::new(1, PlayerType::FreeRider, 10);
        let behavior = Behavior {
            noise: 3,
            ..Behavior::default()
        };
        assert_eq!(agent.decide(1, None, &behavior, &mut MinRng), 0);
        assert_eq!(agent.decide(2, Some(0.0), &behavior, &mut MinRng), 0);
    }

    #[test]
    fn conditional_with_minimum_draws_never_goes_negative() {
        let agent = Agent::new(1, PlayerType::Conditional, 10);
        let behavior = Behavior {
            noise: 2,
            fatigue_after_round: Some(1),
            ..Behavior::default()
        };
        assert_eq!(agent.decide(5, Some(0.4), &behavior, &mut MinRng), 0);
    }

    #[test]
    fn fatigue_applies_only_after_threshold() {
        let agent = Agent::new(1, PlayerType::Conditional, 10);
        let behavior = Behavior {
            noise: 0,
            fatigue_after_round: Some(10),
            fatigue_max_decay: 2,
            ..Behavior::default()
        };
        let mut rng = seeded_rng(9);
        for _ in 0..20 {
            assert_eq!(agent.decide(10, Some(6.0), &behavior, &mut rng), 6);
            let late = agent.decide(11, Some(6.0), &behavior, &mut rng);
            assert!((4..=6).contains(&late), "late {late}");
        }
    }

    #[test]
    fn zero_noise_is_deterministic() {
        let noise = Noise::new(0);
        let mut rng = seeded_rng(1);
        assert!((0..10).all(|_| noise.sample(&mut rng) == 0));
    }

    #[test]
    fn reset_clears_history_but_keeps_identity() {
        let mut agent = Agent::new(7, PlayerType::Altruist, 12);
        agent.record(10, 14.5);
        agent.record(12, 13.0);
        assert_eq!(agent.contributions(), &[10, 12]);

        agent.reset();
        assert!(agent.contributions().is_empty());
        assert!(agent.rewards().is_empty());
        assert_eq!(agent.id, 7);
        assert_eq!(agent.player_type, PlayerType::Altruist);
        assert_eq!(agent.endowment, 12);
    }

    #[test]
    fn rejects_inverted_opening_band() {
        let behavior = Behavior {
            conditional_opening_min_ratio: 0.8,
            conditional_opening_max_ratio: 0.2,
            ..Behavior::default()
        };
        assert!(matches!(behavior.validate(), Err(SimError::Config(_))));
    }
}
