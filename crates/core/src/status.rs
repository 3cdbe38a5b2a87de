//! Run status state machine.
//!
//! A run mirrors one remote prediction. Its status only ever moves
//! forward: `starting → processing → {succeeded | failed | canceled}`.
//! Transitions are observed from the provider, never invented locally,
//! and a terminal status is never reopened.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a run, matching the provider's prediction
/// status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl RunStatus {
    /// Stored form of the status (lowercase, matches serde rename).
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Starting => "starting",
            RunStatus::Processing => "processing",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::Canceled => "canceled",
        }
    }

    /// Whether no further transitions can follow this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Canceled
        )
    }

    /// Whether moving from `self` to `next` is a legal forward
    /// transition. Writing the same status again is allowed (status
    /// refreshes are idempotent); leaving a terminal status is not.
    pub fn can_transition(&self, next: RunStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            RunStatus::Starting => true,
            RunStatus::Processing => next.is_terminal(),
            _ => false,
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starting" => Ok(RunStatus::Starting),
            "processing" => Ok(RunStatus::Processing),
            "succeeded" => Ok(RunStatus::Succeeded),
            "failed" => Ok(RunStatus::Failed),
            "canceled" => Ok(RunStatus::Canceled),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!RunStatus::Starting.is_terminal());
        assert!(!RunStatus::Processing.is_terminal());
        assert!(RunStatus::Succeeded.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Canceled.is_terminal());
    }

    #[test]
    fn forward_transitions_are_legal() {
        assert!(RunStatus::Starting.can_transition(RunStatus::Processing));
        assert!(RunStatus::Starting.can_transition(RunStatus::Succeeded));
        assert!(RunStatus::Processing.can_transition(RunStatus::Failed));
        assert!(RunStatus::Processing.can_transition(RunStatus::Canceled));
    }

    #[test]
    fn terminal_statuses_never_reopen() {
        for terminal in [RunStatus::Succeeded, RunStatus::Failed, RunStatus::Canceled] {
            assert!(!terminal.can_transition(RunStatus::Starting));
            assert!(!terminal.can_transition(RunStatus::Processing));
        }
        assert!(!RunStatus::Succeeded.can_transition(RunStatus::Failed));
    }

    #[test]
    fn repeated_status_is_idempotent() {
        for s in [
            RunStatus::Starting,
            RunStatus::Processing,
            RunStatus::Succeeded,
        ] {
            assert!(s.can_transition(s));
        }
    }

    #[test]
    fn round_trip_through_str() {
        for s in [
            RunStatus::Starting,
            RunStatus::Processing,
            RunStatus::Succeeded,
            RunStatus::Failed,
            RunStatus::Canceled,
        ] {
            assert_eq!(s.as_str().parse::<RunStatus>().unwrap(), s);
        }
        assert!("queued".parse::<RunStatus>().is_err());
    }
}
