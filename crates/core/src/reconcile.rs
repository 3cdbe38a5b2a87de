//! Terminal-state reconciliation between a local run and its remote
//! prediction.
//!
//! The remote prediction is authoritative; the local run is a
//! best-effort mirror refreshed opportunistically on read. Every path
//! that folds a remote snapshot into a run (poll today, stream if ever
//! extended) goes through [`merge_terminal_state`] so there is exactly
//! one reconciliation rule.

use crate::status::RunStatus;
use crate::types::Timestamp;

/// The subset of a remote prediction relevant to reconciliation.
#[derive(Debug, Clone)]
pub struct RemoteSnapshot {
    pub status: RunStatus,
    pub output: Option<serde_json::Value>,
    pub error: Option<serde_json::Value>,
    pub completed_at: Option<Timestamp>,
    /// Provider-reported predict time in seconds, when present.
    pub predict_time_secs: Option<f64>,
}

/// Fields to write onto a run that has just been observed terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalUpdate {
    pub status: RunStatus,
    pub output: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub completed_at: Timestamp,
    pub duration_ms: Option<i64>,
}

/// Decide whether (and how) a run should be updated from a remote
/// snapshot.
///
/// Returns `None` when there is nothing to write: the remote side is
/// still running, or the run already holds a terminal status. Once a
/// run is terminal its stored output, error, and completion time are
/// never touched again.
pub fn merge_terminal_state(
    current: RunStatus,
    remote: &RemoteSnapshot,
) -> Option<TerminalUpdate> {
    if !remote.status.is_terminal() || current.is_terminal() {
        return None;
    }

    let error_message = remote.error.as_ref().and_then(|e| match e {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    });

    Some(TerminalUpdate {
        status: remote.status,
        output: remote.output.clone(),
        error_message,
        completed_at: remote.completed_at.unwrap_or_else(chrono::Utc::now),
        duration_ms: remote
            .predict_time_secs
            .map(|secs| (secs * 1000.0).round() as i64),
    })
}
