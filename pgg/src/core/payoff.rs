//! Linear public-goods payoff and the governance policies applied to it.
//!
//! ```text
//! base = (E - c) + (pool * M) / N
//! ```
//!
//! Keeping a unit is a private good; the multiplied pool is split equally
//! regardless of who paid into it.

use crate::core::policy::Policy;
use crate::core::types::Governance;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoffRule {
    pub endowment: u32,
    pub multiplier: f64,
    pub players: u32,
    pub punishment_threshold: f64,
    pub reward_bonus: f64,
}

impl PayoffRule {
    pub fn new(endowment: u32, multiplier: f64, players: u32, policy: &Policy) -> Self {
        Self {
            endowment,
            multiplier,
            players,
            punishment_threshold: policy.punishment_threshold,
            reward_bonus: policy.reward_bonus,
        }
    }

    /// Un-governed payoff, before flooring and rounding.
    pub fn base(&self, contribution: u32, total_pool: u32) -> f64 {
        let kept = f64::from(self.endowment) - f64::from(contribution);
        kept + f64::from(total_pool) * self.multiplier / f64::from(self.players)
    }

    /// Realized payoff under `governance`, floored at 0 and rounded to cents.
    ///
    /// `contributions` is the full set of this round's contributions; its mean
    /// is the reference for both punishment and reward.
    pub fn payoff(
        &self,
        contribution: u32,
        total_pool: u32,
        governance: Governance,
        contributions: &[u32],
    ) -> f64 {
        let avg = mean(contributions);
        let base = self.base(contribution, total_pool);
        let governed = match governance {
            Governance::None => base,
            Governance::Punishment => {
                if f64::from(contribution) < avg * self.punishment_threshold {
                    0.0
                } else {
                    base
                }
            }
            Governance::Reward => {
                if f64::from(contribution) > avg {
                    base + self.reward_bonus
                } else {
                    base
                }
            }
        };
        round_cents(governed.max(0.0))
    }
}

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64
}

/// Round to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> PayoffRule {
        PayoffRule::new(10, 2.0, 4, &Policy::default())
    }

    #[test]
    fn base_matches_textbook_formula() {
        // pool 20 * 2.0 / 4 = 10, kept 10 - 5 = 5
        assert_eq!(rule().base(5, 20), 15.0);
        assert_eq!(rule().base(0, 20), 20.0);
    }

    #[test]
    fn none_leaves_base_untouched() {
        let contributions = [0, 5, 5, 10];
        assert_eq!(
            rule().payoff(0, 20, Governance::None, &contributions),
            20.0
        );
    }

    #[test]
    fn punishment_confiscates_below_threshold() {
        // avg 5.0, threshold 4.0
        let contributions = [3, 4, 5, 8];
        let r = rule();
        assert_eq!(r.payoff(3, 20, Governance::Punishment, &contributions), 0.0);
        assert_eq!(r.payoff(4, 20, Governance::Punishment, &contributions), 16.0);
        assert_eq!(r.payoff(8, 20, Governance::Punishment, &contributions), 12.0);
    }

    #[test]
    fn full_threshold_punishes_anything_below_average() {
        let policy = Policy {
            punishment_threshold: 1.0,
            ..Policy::default()
        };
        let r = PayoffRule::new(10, 2.0, 4, &policy);
        let contributions = [4, 4, 6, 6];
        assert_eq!(r.payoff(4, 20, Governance::Punishment, &contributions), 0.0);
    }

    #[test]
    fn reward_bonus_requires_strictly_above_average() {
        let contributions = [5, 5, 2, 8];
        let r = rule();
        assert_eq!(r.payoff(8, 20, Governance::Reward, &contributions), 17.0);
        assert_eq!(r.payoff(5, 20, Governance::Reward, &contributions), 15.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let r = PayoffRule::new(10, 1.7, 3, &Policy::default());
        // 9 + 10 * 1.7 / 3 = 14.6666...
        assert_eq!(r.payoff(1, 10, Governance::None, &[1, 4, 5]), 14.67);
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1, 2]), 1.5);
    }
}
