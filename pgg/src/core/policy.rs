//! Magnitudes of the governance rules.
//!
//! The rule *forms* are fixed: punishment confiscates the whole payoff of any
//! agent below `avg * punishment_threshold`, and reward adds a flat bonus to
//! any agent strictly above the average. Only magnitudes are configurable.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Fraction of the round average below which the payoff is confiscated.
    /// `1.0` reproduces the "below average, no slack" variant.
    pub punishment_threshold: f64,
    /// Additive bonus for contributing strictly more than the round average.
    pub reward_bonus: f64,
    /// Under punishment, free riders raise their decision to at least
    /// `floor(prev_avg * deterrence_ratio)`.
    pub deterrence_ratio: f64,
    /// Under reward, conditional agents add this to their raw decision.
    pub reward_chase_increment: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            punishment_threshold: 0.8,
            reward_bonus: 5.0,
            deterrence_ratio: 0.8,
            reward_chase_increment: 1,
        }
    }
}

impl Policy {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.punishment_threshold) {
            return Err(SimError::config(format!(
                "policy.punishment_threshold must be within [0, 1], got {}",
                self.punishment_threshold
            )));
        }
        if !self.reward_bonus.is_finite() || self.reward_bonus < 0.0 {
            return Err(SimError::config(format!(
                "policy.reward_bonus must be a finite value >= 0, got {}",
                self.reward_bonus
            )));
        }
        if !(0.0..=1.0).contains(&self.deterrence_ratio) {
            return Err(SimError::config(format!(
                "policy.deterrence_ratio must be within [0, 1], got {}",
                self.deterrence_ratio
            )));
        }
        Ok(())
    }
}
