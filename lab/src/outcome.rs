use serde::{Deserialize, Serialize};

use crate::judge::Judgment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    Error,
}

/// `None` means the simulation itself failed and no checks ran.
pub fn classify_outcome(judgment: Option<&Judgment>) -> Outcome {
    match judgment {
        Some(judgment) if judgment.all_passed() => Outcome::Pass,
        Some(_) => Outcome::Fail,
        None => Outcome::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::{CheckOutcome, Judgment};

    fn judgment(pass: bool) -> Judgment {
        Judgment {
            checks: vec![CheckOutcome::IdenticalCohorts {
                passed: pass,
                modes: 3,
                mismatched: Vec::new(),
            }],
        }
    }

    #[test]
    fn pass_when_every_check_passes() {
        assert_eq!(classify_outcome(Some(&judgment(true))), Outcome::Pass);
    }

    #[test]
    fn fail_when_any_check_fails() {
        assert_eq!(classify_outcome(Some(&judgment(false))), Outcome::Fail);
    }

    #[test]
    fn error_when_simulation_failed() {
        assert_eq!(classify_outcome(None), Outcome::Error);
    }
}
