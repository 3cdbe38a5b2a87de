//! App catalog models (read-only collaborator).

use modelmart_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A published version of a catalog app: the model reference a
/// deployment is created from.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AppVersion {
    pub id: Uuid,
    pub app_id: Uuid,
    /// Model reference in `owner/name` form.
    pub replicate_model: String,
    /// Pinned model version id.
    pub version_id: String,
    pub default_hardware: String,
    pub created_at: Timestamp,
}
