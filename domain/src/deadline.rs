use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::DomainError;

/// Hard limit of a negotiation session, counted either in rounds or in
/// elapsed wall-clock time. The engine itself never measures time; the
/// session driver reports progress every turn and the clock normalizes it.
#[derive(Clone, Debug, Display, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Deadline {
    #[display(fmt = "rounds")]
    Rounds(u64),
    #[display(fmt = "time")]
    Time(#[serde(with = "humantime_serde")] Duration),
}

/// Driver-reported progress of the current session.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
pub enum Progress {
    #[display(fmt = "rounds")]
    Round(u64),
    #[display(fmt = "time")]
    Elapsed(Duration),
}

/// Normalizes driver-reported progress against the session deadline.
#[derive(Clone, Debug)]
pub struct DeadlineClock {
    deadline: Deadline,
}

impl DeadlineClock {
    pub fn new(deadline: Deadline) -> DeadlineClock {
        DeadlineClock { deadline }
    }

    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    /// Fraction of the session consumed, clamped to `[0, 1]`. Reporting
    /// progress in the wrong unit is a driver contract violation.
    pub fn status(&self, progress: Progress) -> Result<f64, DomainError> {
        let fraction = match (&self.deadline, progress) {
            (Deadline::Rounds(limit), Progress::Round(round)) => {
                round as f64 / (*limit).max(1) as f64
            }
            (Deadline::Time(limit), Progress::Elapsed(elapsed)) => {
                elapsed.as_secs_f64() / limit.as_secs_f64().max(f64::EPSILON)
            }
            (deadline, progress) => {
                return Err(DomainError::ProgressMismatch {
                    deadline: match deadline {
                        Deadline::Rounds(_) => "rounds",
                        Deadline::Time(_) => "time",
                    },
                    progress: match progress {
                        Progress::Round(_) => "rounds",
                        Progress::Elapsed(_) => "time",
                    },
                })
            }
        };
        Ok(fraction.max(0.0).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 0.0; "session start")]
    #[test_case(50, 0.5; "halfway")]
    #[test_case(100, 1.0; "at the limit")]
    #[test_case(140, 1.0; "clamped past the limit")]
    fn round_based_status(round: u64, expected: f64) {
        let clock = DeadlineClock::new(Deadline::Rounds(100));
        assert!((clock.status(Progress::Round(round)).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn time_based_status() {
        let clock = DeadlineClock::new(Deadline::Time(Duration::from_secs(200)));
        let status = clock.status(Progress::Elapsed(Duration::from_secs(50))).unwrap();
        assert!((status - 0.25).abs() < 1e-9);
    }

    #[test]
    fn mismatched_progress_unit_is_rejected() {
        let clock = DeadlineClock::new(Deadline::Rounds(100));
        let result = clock.status(Progress::Elapsed(Duration::from_secs(1)));
        assert!(matches!(result, Err(DomainError::ProgressMismatch { .. })));
    }

    #[test]
    fn deadline_serializes_with_humantime() {
        let deadline = Deadline::Time(Duration::from_secs(90));
        let serialized = serde_yaml::to_string(&deadline).unwrap();
        let parsed: Deadline = serde_yaml::from_str(&serialized).unwrap();
        assert_eq!(parsed, deadline);
    }
}
