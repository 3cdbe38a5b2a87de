//! Repository for the `deployments` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::deployment::{Deployment, NewDeployment};

/// Column list for `deployments` queries.
const COLUMNS: &str = "\
    id, app_id, user_id, replicate_owner, deployment_name, \
    hardware, min_instances, max_instances, created_at";

/// Provides CRUD operations for deployments.
pub struct DeploymentRepo;

impl DeploymentRepo {
    /// Find the unique deployment for an (app, user) pair, if any.
    pub async fn find_for_app_and_user(
        pool: &PgPool,
        app_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Deployment>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM deployments WHERE app_id = $1 AND user_id = $2");
        sqlx::query_as::<_, Deployment>(&query)
            .bind(app_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a deployment by id, scoped to its owning user.
    ///
    /// Returns `None` both for missing rows and rows owned by someone
    /// else; callers map that to not-found so ownership is never
    /// leaked through error differences.
    pub async fn find_owned(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Deployment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deployments WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Deployment>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new deployment row.
    ///
    /// Fails with a unique-constraint violation
    /// (`uq_deployments_app_user`) when a concurrent request already
    /// created a row for the same (app, user) pair; see
    /// [`crate::is_unique_violation`].
    pub async fn insert(pool: &PgPool, input: &NewDeployment) -> Result<Deployment, sqlx::Error> {
        let query = format!(
            "INSERT INTO deployments \
             (app_id, user_id, replicate_owner, deployment_name, hardware, min_instances, max_instances) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deployment>(&query)
            .bind(input.app_id)
            .bind(input.user_id)
            .bind(&input.replicate_owner)
            .bind(&input.deployment_name)
            .bind(&input.hardware)
            .bind(input.min_instances)
            .bind(input.max_instances)
            .fetch_one(pool)
            .await
    }

    /// Delete a deployment row; dependent runs cascade.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM deployments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// List a user's deployments, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Deployment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deployments WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Deployment>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
