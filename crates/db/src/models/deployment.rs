//! Deployment entity models.

use modelmart_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `deployments` table: one remote compute endpoint
/// bound to one (app, user) pair.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deployment {
    pub id: Uuid,
    pub app_id: Uuid,
    pub user_id: Uuid,
    /// Account owning the deployment on the provider side.
    pub replicate_owner: String,
    /// Provider-side deployment name (deterministic, see
    /// `modelmart_core::naming`).
    pub deployment_name: String,
    pub hardware: String,
    pub min_instances: i32,
    pub max_instances: i32,
    pub created_at: Timestamp,
}

/// Insert payload for a new deployment row.
#[derive(Debug, Clone)]
pub struct NewDeployment {
    pub app_id: Uuid,
    pub user_id: Uuid,
    pub replicate_owner: String,
    pub deployment_name: String,
    pub hardware: String,
    pub min_instances: i32,
    pub max_instances: i32,
}
