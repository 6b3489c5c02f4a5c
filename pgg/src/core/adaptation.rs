//! Governance-aware strategic adaptation of raw decisions.
//!
//! Applied after `Agent::decide` and before contributions are finalized.
//! Only the named type reacts to the named mode:
//!
//! - punishment: free riders raise to `floor(prev_avg * deterrence_ratio)`
//! - reward: conditional agents add `reward_chase_increment`

use crate::core::policy::Policy;
use crate::core::types::{Governance, PlayerType};

/// Adjust a raw decision for the active governance mode.
///
/// The result may exceed the endowment; callers clamp afterwards. With no
/// observed average (`prev_avg == None`) free riders have nothing to match and
/// keep their decision.
pub fn adapt(
    raw: i64,
    player_type: PlayerType,
    governance: Governance,
    prev_avg: Option<f64>,
    policy: &Policy,
) -> i64 {
    match (governance, player_type) {
        (Governance::Punishment, PlayerType::FreeRider) => match prev_avg {
            Some(avg) => raw.max((avg * policy.deterrence_ratio).floor() as i64),
            None => raw,
        },
        (Governance::Reward, PlayerType::Conditional) => {
            raw + i64::from(policy.reward_chase_increment)
        }
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_rider_deters_under_punishment() {
        let policy = Policy::default();
        assert_eq!(
            adapt(1, PlayerType::FreeRider, Governance::Punishment, Some(6.5), &policy),
            5
        );
        assert_eq!(
            adapt(7, PlayerType::FreeRider, Governance::Punishment, Some(6.5), &policy),
            7
        );
    }

    #[test]
    fn free_rider_keeps_decision_without_observed_average() {
        let policy = Policy::default();
        assert_eq!(
            adapt(1, PlayerType::FreeRider, Governance::Punishment, None, &policy),
            1
        );
    }

    #[test]
    fn conditional_chases_reward() {
        let policy = Policy::default();
        assert_eq!(
            adapt(10, PlayerType::Conditional, Governance::Reward, Some(9.0), &policy),
            11
        );
    }

    #[test]
    fn other_pairs_are_untouched() {
        let policy = Policy::default();
        for player_type in PlayerType::ALL {
            assert_eq!(adapt(3, player_type, Governance::None, Some(8.0), &policy), 3);
        }
        assert_eq!(
            adapt(3, PlayerType::Conditional, Governance::Punishment, Some(8.0), &policy),
            3
        );
        assert_eq!(
            adapt(3, PlayerType::FreeRider, Governance::Reward, Some(8.0), &policy),
            3
        );
        assert_eq!(
            adapt(3, PlayerType::Altruist, Governance::Reward, Some(8.0), &policy),
            3
        );
    }
}
