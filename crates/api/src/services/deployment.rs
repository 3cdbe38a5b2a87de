//! Deployment lifecycle: per-user provider deployments for marketplace apps.
//!
//! Each (app, user) pair gets at most one provider deployment, enforced
//! by a unique constraint. `ensure_deployment` is the idempotent entry
//! point the prediction flow goes through before running anything.

use modelmart_core::error::CoreError;
use modelmart_core::naming::deployment_name;
use modelmart_db::models::deployment::{Deployment, NewDeployment};
use modelmart_db::models::run::Run;
use modelmart_db::repositories::app_version_repo::AppVersionRepo;
use modelmart_db::repositories::deployment_repo::DeploymentRepo;
use modelmart_db::repositories::run_repo::RunRepo;
use modelmart_db::{is_unique_violation, DbPool};
use modelmart_replicate::types::{CreateDeployment, DeploymentRef};
use modelmart_replicate::ReplicateClient;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Scale-to-zero when idle.
const MIN_INSTANCES: i32 = 0;
const MAX_INSTANCES: i32 = 1;

/// Default page size for run history listings.
const DEFAULT_RUN_LIMIT: i64 = 50;

/// A deployment decorated with the provider's live view of it.
#[derive(Debug, Serialize)]
pub struct DeploymentWithStatus {
    #[serde(flatten)]
    pub deployment: Deployment,
    /// The provider's side of the deployment, or why it could not be
    /// fetched.
    pub replicate_status: RemoteStatus,
}

/// Outcome of asking the provider about a deployment. An unreachable
/// or missing remote deployment is reported explicitly rather than
/// blending into "no release info".
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RemoteStatus {
    Live {
        current_release: Option<serde_json::Value>,
    },
    Unavailable {
        error: String,
    },
}

fn remote_ref(deployment: &Deployment) -> DeploymentRef {
    DeploymentRef::new(&deployment.replicate_owner, &deployment.deployment_name)
}

/// Return the user's deployment for `app_id`, creating it on the
/// provider and recording it locally if it does not exist yet.
///
/// Concurrent callers may race past the fast-path read; the unique
/// constraint on (app_id, user_id) makes exactly one insert win, and
/// the loser re-reads the winner's row. Both racers created the same
/// deterministic provider name, so no orphan is left behind.
pub async fn ensure_deployment(
    pool: &DbPool,
    client: &ReplicateClient,
    app_id: Uuid,
    user_id: Uuid,
) -> AppResult<Deployment> {
    if let Some(existing) = DeploymentRepo::find_for_app_and_user(pool, app_id, user_id).await? {
        return Ok(existing);
    }

    let version = AppVersionRepo::latest_for_app(pool, app_id)
        .await?
        .ok_or_else(|| CoreError::not_found("AppVersion", app_id))?;

    let name = deployment_name(app_id, user_id);
    tracing::info!(%app_id, %user_id, %name, "Creating provider deployment");

    let remote = client
        .create_deployment(&CreateDeployment {
            name,
            model: version.replicate_model.clone(),
            version: version.version_id.clone(),
            hardware: version.default_hardware.clone(),
            min_instances: MIN_INSTANCES,
            max_instances: MAX_INSTANCES,
        })
        .await?;

    let new_deployment = NewDeployment {
        app_id,
        user_id,
        replicate_owner: remote.owner.clone(),
        deployment_name: remote.name.clone(),
        hardware: version.default_hardware,
        min_instances: MIN_INSTANCES,
        max_instances: MAX_INSTANCES,
    };

    match DeploymentRepo::insert(pool, &new_deployment).await {
        Ok(deployment) => Ok(deployment),
        Err(err) if is_unique_violation(&err) => {
            tracing::warn!(
                %app_id,
                %user_id,
                owner = %remote.owner,
                name = %remote.name,
                "Deployment insert lost a race; reusing existing row"
            );
            DeploymentRepo::find_for_app_and_user(pool, app_id, user_id)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError(
                        "Deployment vanished between conflict and re-read".to_string(),
                    )
                })
        }
        Err(err) => {
            // Local record failed for a non-conflict reason; tear the
            // provider deployment down so we don't leak paid capacity.
            if let Err(del_err) = client
                .delete_deployment(&DeploymentRef::new(&remote.owner, &remote.name))
                .await
            {
                tracing::error!(
                    owner = %remote.owner,
                    name = %remote.name,
                    error = %del_err,
                    "Failed to clean up provider deployment after insert failure"
                );
            }
            Err(err.into())
        }
    }
}

/// Delete a deployment owned by `user_id`, provider side first.
///
/// If the provider delete fails the local row is kept, so the caller
/// can retry without losing track of the remote resource.
pub async fn remove_deployment(
    pool: &DbPool,
    client: &ReplicateClient,
    deployment_id: Uuid,
    user_id: Uuid,
) -> AppResult<()> {
    let deployment = DeploymentRepo::find_owned(pool, deployment_id, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Deployment", deployment_id))?;

    client.delete_deployment(&remote_ref(&deployment)).await?;

    DeploymentRepo::delete(pool, deployment_id).await?;
    tracing::info!(%deployment_id, %user_id, "Deployment removed");
    Ok(())
}

/// List all deployments belonging to `user_id`.
pub async fn list_deployments(pool: &DbPool, user_id: Uuid) -> AppResult<Vec<Deployment>> {
    Ok(DeploymentRepo::list_for_user(pool, user_id).await?)
}

/// Fetch a single deployment with the provider's current view attached.
///
/// A provider fetch failure does not fail the request; the local
/// record is still useful, and the failure is carried in the response
/// as [`RemoteStatus::Unavailable`] so a dead remote deployment stays
/// visible instead of looking merely release-less.
pub async fn describe_deployment(
    pool: &DbPool,
    client: &ReplicateClient,
    deployment_id: Uuid,
    user_id: Uuid,
) -> AppResult<DeploymentWithStatus> {
    let deployment = DeploymentRepo::find_owned(pool, deployment_id, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Deployment", deployment_id))?;

    let replicate_status = match client.get_deployment(&remote_ref(&deployment)).await {
        Ok(remote) => RemoteStatus::Live {
            current_release: remote.current_release,
        },
        Err(err) => {
            tracing::warn!(
                %deployment_id,
                error = %err,
                "Failed to fetch provider deployment status"
            );
            RemoteStatus::Unavailable {
                error: err.to_string(),
            }
        }
    };

    Ok(DeploymentWithStatus {
        deployment,
        replicate_status,
    })
}

/// List recent runs for a deployment owned by `user_id`.
pub async fn run_history(
    pool: &DbPool,
    deployment_id: Uuid,
    user_id: Uuid,
    limit: Option<i64>,
) -> AppResult<Vec<Run>> {
    DeploymentRepo::find_owned(pool, deployment_id, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Deployment", deployment_id))?;

    let limit = limit.unwrap_or(DEFAULT_RUN_LIMIT).clamp(1, 200);
    Ok(RunRepo::list_for_deployment(pool, deployment_id, limit).await?)
}
