//! Repository for the `runs` table.
//!
//! Terminal statuses are write-once: both update operations carry a
//! `status NOT IN (terminal)` guard so a run that already reached
//! succeeded/failed/canceled is never rewritten, no matter how many
//! status refreshes race.

use modelmart_core::reconcile::TerminalUpdate;
use modelmart_core::status::RunStatus;
use modelmart_core::types::Timestamp;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::run::{NewRun, Run, RunOwnership};

/// Column list for `runs` queries.
const COLUMNS: &str = "\
    id, deployment_id, replicate_prediction_id, status, \
    input_payload, output_payload, error_message, \
    created_at, completed_at, duration_ms";

/// SQL predicate matching rows that have not reached a terminal state.
const NOT_TERMINAL: &str = "status NOT IN ('succeeded', 'failed', 'canceled')";

/// Provides CRUD operations for run records.
pub struct RunRepo;

impl RunRepo {
    /// Insert the local mirror for a freshly accepted prediction.
    pub async fn insert(pool: &PgPool, input: &NewRun) -> Result<Run, sqlx::Error> {
        let query = format!(
            "INSERT INTO runs (deployment_id, replicate_prediction_id, status, input_payload) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(input.deployment_id)
            .bind(&input.replicate_prediction_id)
            .bind(input.status.as_str())
            .bind(&input.input_payload)
            .fetch_one(pool)
            .await
    }

    /// Resolve a run by remote prediction id together with the user
    /// owning its deployment.
    pub async fn find_with_owner(
        pool: &PgPool,
        prediction_id: &str,
    ) -> Result<Option<RunOwnership>, sqlx::Error> {
        sqlx::query_as::<_, RunOwnership>(
            "SELECT r.id, r.deployment_id, r.status, d.user_id \
             FROM runs r \
             JOIN deployments d ON d.id = r.deployment_id \
             WHERE r.replicate_prediction_id = $1",
        )
        .bind(prediction_id)
        .fetch_optional(pool)
        .await
    }

    /// List a deployment's runs, newest first.
    pub async fn list_for_deployment(
        pool: &PgPool,
        deployment_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Run>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runs \
             WHERE deployment_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(deployment_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Apply a reconciled terminal snapshot to a run.
    ///
    /// Returns `true` if the row was updated, `false` if it was
    /// already terminal (first terminal write wins).
    pub async fn mark_terminal(
        pool: &PgPool,
        run_id: Uuid,
        update: &TerminalUpdate,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE runs \
             SET status = $2, output_payload = $3, error_message = $4, \
                 completed_at = $5, duration_ms = $6 \
             WHERE id = $1 AND {NOT_TERMINAL}"
        );
        let result = sqlx::query(&query)
            .bind(run_id)
            .bind(update.status.as_str())
            .bind(&update.output)
            .bind(&update.error_message)
            .bind(update.completed_at)
            .bind(update.duration_ms)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a run canceled with the given completion time. Same
    /// first-write-wins guard as [`mark_terminal`](Self::mark_terminal).
    pub async fn mark_canceled(
        pool: &PgPool,
        run_id: Uuid,
        completed_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE runs SET status = $2, completed_at = $3 WHERE id = $1 AND {NOT_TERMINAL}"
        );
        let result = sqlx::query(&query)
            .bind(run_id)
            .bind(RunStatus::Canceled.as_str())
            .bind(completed_at)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
