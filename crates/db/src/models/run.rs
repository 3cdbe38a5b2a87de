//! Run entity models: the local mirror of one remote prediction.

use modelmart_core::status::RunStatus;
use modelmart_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `runs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Run {
    pub id: Uuid,
    pub deployment_id: Uuid,
    /// Provider-side prediction id (unique, 1:1 with this row).
    pub replicate_prediction_id: String,
    /// Stored lowercase status text; see [`Run::run_status`].
    pub status: String,
    pub input_payload: Option<serde_json::Value>,
    pub output_payload: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub duration_ms: Option<i64>,
}

impl Run {
    /// Parsed status. Rows only ever hold values written from
    /// [`RunStatus::as_str`], so an unknown value indicates outside
    /// tampering; it is treated as the initial state.
    pub fn run_status(&self) -> RunStatus {
        self.status.parse().unwrap_or(RunStatus::Starting)
    }
}

/// Insert payload for a new run row.
#[derive(Debug, Clone)]
pub struct NewRun {
    pub deployment_id: Uuid,
    pub replicate_prediction_id: String,
    pub status: RunStatus,
    pub input_payload: serde_json::Value,
}

/// Ownership projection for access checks: a run joined with the
/// user that owns its deployment.
#[derive(Debug, Clone, FromRow)]
pub struct RunOwnership {
    pub id: Uuid,
    pub deployment_id: Uuid,
    pub status: String,
    pub user_id: Uuid,
}

impl RunOwnership {
    pub fn run_status(&self) -> RunStatus {
        self.status.parse().unwrap_or(RunStatus::Starting)
    }
}
