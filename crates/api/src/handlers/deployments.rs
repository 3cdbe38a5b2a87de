//! Handlers for deployment management endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::deployment;
use crate::services::deployment::DeploymentWithStatus;
use crate::state::AppState;

/// Query parameters for the run history endpoint.
#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    /// Maximum number of runs to return (default 50, capped at 200).
    pub limit: Option<i64>,
}

/// GET /deployments
///
/// List the authenticated user's deployments.
pub async fn list_deployments(
    State(state): State<AppState>,
    AuthUser { user_id }: AuthUser,
) -> AppResult<Json<DataResponse<Vec<modelmart_db::models::deployment::Deployment>>>> {
    let deployments = deployment::list_deployments(&state.pool, user_id).await?;
    Ok(Json(DataResponse { data: deployments }))
}

/// GET /deployments/{id}
///
/// Fetch one deployment with the provider's current release attached.
pub async fn get_deployment(
    State(state): State<AppState>,
    AuthUser { user_id }: AuthUser,
    Path(deployment_id): Path<Uuid>,
) -> AppResult<Json<DataResponse<DeploymentWithStatus>>> {
    let detail =
        deployment::describe_deployment(&state.pool, &state.replicate, deployment_id, user_id)
            .await?;
    Ok(Json(DataResponse { data: detail }))
}

/// DELETE /deployments/{id}
///
/// Tear down a deployment. Answers 202: the provider releases the
/// underlying capacity asynchronously after its delete call returns.
pub async fn delete_deployment(
    State(state): State<AppState>,
    AuthUser { user_id }: AuthUser,
    Path(deployment_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    deployment::remove_deployment(&state.pool, &state.replicate, deployment_id, user_id).await?;
    Ok(StatusCode::ACCEPTED)
}

/// GET /deployments/{id}/runs
///
/// List recent runs for a deployment, newest first.
pub async fn list_runs(
    State(state): State<AppState>,
    AuthUser { user_id }: AuthUser,
    Path(deployment_id): Path<Uuid>,
    Query(query): Query<RunsQuery>,
) -> AppResult<Json<DataResponse<Vec<modelmart_db::models::run::Run>>>> {
    let runs =
        deployment::run_history(&state.pool, deployment_id, user_id, query.limit).await?;
    Ok(Json(DataResponse { data: runs }))
}
