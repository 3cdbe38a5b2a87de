//! Prediction lifecycle: start, poll, cancel.
//!
//! The database is the system of record for runs; the provider is the
//! system of record for prediction state. Polling reconciles the two
//! by merging the provider's terminal snapshot into the local row.

use chrono::Utc;
use futures::Stream;
use modelmart_core::error::CoreError;
use modelmart_core::reconcile::merge_terminal_state;
use modelmart_db::models::run::{NewRun, RunOwnership};
use modelmart_db::repositories::app_repo::AppRepo;
use modelmart_db::repositories::deployment_repo::DeploymentRepo;
use modelmart_db::repositories::run_repo::RunRepo;
use modelmart_db::DbPool;
use modelmart_replicate::types::{DeploymentRef, Prediction, PredictionOptions};
use modelmart_replicate::{ReplicateClient, ReplicateError, SseEvent};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// How long the provider may hold the create request open waiting for
/// the prediction to finish, in seconds. Skipped for streaming runs.
const PREFER_WAIT_SECS: u64 = 10;

/// Resolve a run by prediction id, scoped to the requesting user.
async fn owned_run(
    pool: &DbPool,
    prediction_id: &str,
    user_id: Uuid,
) -> AppResult<RunOwnership> {
    let run = RunRepo::find_with_owner(pool, prediction_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Run", prediction_id))?;
    if run.user_id != user_id {
        return Err(CoreError::Forbidden("Run belongs to another user".to_string()).into());
    }
    Ok(run)
}

/// Start a prediction on the user's deployment and record a run row.
///
/// The provider call happens first; if recording the run locally then
/// fails, the remote job is left running and the error is only logged,
/// so the caller still gets the prediction back and can poll it.
pub async fn run_prediction(
    pool: &DbPool,
    client: &ReplicateClient,
    deployment_id: Uuid,
    input: serde_json::Value,
    user_id: Uuid,
    stream: bool,
) -> AppResult<Prediction> {
    let deployment = DeploymentRepo::find_owned(pool, deployment_id, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Deployment", deployment_id))?;

    let options = PredictionOptions {
        prefer_wait_secs: (!stream).then_some(PREFER_WAIT_SECS),
        stream,
        version: None,
    };

    let remote = DeploymentRef::new(&deployment.replicate_owner, &deployment.deployment_name);
    let prediction = client.create_prediction(&remote, &input, &options).await?;

    let new_run = NewRun {
        deployment_id,
        replicate_prediction_id: prediction.id.clone(),
        status: prediction.status,
        input_payload: input,
    };
    if let Err(err) = RunRepo::insert(pool, &new_run).await {
        tracing::error!(
            prediction_id = %prediction.id,
            %deployment_id,
            error = %err,
            "Failed to record run; remote prediction left running"
        );
    }

    tracing::info!(
        prediction_id = %prediction.id,
        %deployment_id,
        status = %prediction.status,
        stream,
        "Prediction started"
    );
    Ok(prediction)
}

/// Fetch a prediction's current state and fold any terminal outcome
/// into the local run row.
///
/// The first poll to observe a terminal state wins the update; later
/// polls see the guarded UPDATE match zero rows and change nothing.
pub async fn get_prediction_status(
    pool: &DbPool,
    client: &ReplicateClient,
    prediction_id: &str,
    user_id: Uuid,
) -> AppResult<Prediction> {
    let run = owned_run(pool, prediction_id, user_id).await?;

    let prediction = client.get_prediction(prediction_id).await?;

    if let Some(update) = merge_terminal_state(run.run_status(), &prediction.snapshot()) {
        match RunRepo::mark_terminal(pool, run.id, &update).await {
            Ok(true) => {
                tracing::info!(
                    %prediction_id,
                    status = %update.status,
                    duration_ms = ?update.duration_ms,
                    "Run reached terminal state"
                );
            }
            Ok(false) => {
                // Another poll got there first.
            }
            Err(err) => {
                tracing::error!(%prediction_id, error = %err, "Failed to persist terminal state");
            }
        }
    }

    Ok(prediction)
}

/// Cancel a running prediction and mark the local run canceled.
pub async fn abort_prediction(
    pool: &DbPool,
    client: &ReplicateClient,
    prediction_id: &str,
    user_id: Uuid,
) -> AppResult<Prediction> {
    let run = owned_run(pool, prediction_id, user_id).await?;

    let prediction = client.cancel_prediction(prediction_id).await?;

    match RunRepo::mark_canceled(pool, run.id, Utc::now()).await {
        Ok(updated) => {
            tracing::info!(%prediction_id, updated, "Prediction canceled");
        }
        Err(err) => {
            tracing::error!(%prediction_id, error = %err, "Failed to mark run canceled");
        }
    }

    Ok(prediction)
}

/// One-shot convenience flow: resolve an app by slug, ensure the
/// caller has a deployment for it, and start a non-streaming run.
pub async fn clone_run(
    pool: &DbPool,
    client: &ReplicateClient,
    app_slug: &str,
    input: serde_json::Value,
    user_id: Uuid,
) -> AppResult<Prediction> {
    let app_id = AppRepo::find_id_by_slug(pool, app_slug)
        .await?
        .ok_or_else(|| CoreError::not_found("App", app_slug))?;

    let deployment =
        super::deployment::ensure_deployment(pool, client, app_id, user_id).await?;

    run_prediction(pool, client, deployment.id, input, user_id, false).await
}

/// Open the provider's push channel for a prediction the user owns.
///
/// Fails with [`AppError::StreamUnavailable`] when the prediction
/// carries no stream URL (model without streaming support, or a run
/// created without `stream: true`).
pub async fn open_event_stream(
    pool: &DbPool,
    client: &ReplicateClient,
    prediction_id: &str,
    user_id: Uuid,
) -> AppResult<impl Stream<Item = Result<SseEvent, ReplicateError>> + Send> {
    owned_run(pool, prediction_id, user_id).await?;

    let prediction = client.get_prediction(prediction_id).await?;
    let Some(stream_url) = prediction.urls.stream else {
        return Err(AppError::StreamUnavailable);
    };

    tracing::debug!(%prediction_id, "Opening provider event stream");
    Ok(client.stream_prediction(&stream_url).await?)
}
