//! Integration tests for run ownership checks against a real database.
//!
//! Ownership is resolved before any provider call, so every test here
//! uses a client pointed at a dead port: if a flow contacted the
//! provider, it would fail with a transport error instead of the
//! expected domain error.

mod common;

use assert_matches::assert_matches;
use modelmart_api::error::AppError;
use modelmart_api::services::prediction;
use modelmart_core::error::CoreError;
use modelmart_core::status::RunStatus;
use modelmart_db::models::deployment::NewDeployment;
use modelmart_db::models::run::NewRun;
use modelmart_db::repositories::{DeploymentRepo, RunRepo};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// Seed an app, a deployment owned by `owner`, and one processing run;
/// returns the run's prediction id.
async fn seed_run(pool: &PgPool, owner: Uuid) -> String {
    let app_id = common::seed_app(pool).await;
    let deployment = DeploymentRepo::insert(
        pool,
        &NewDeployment {
            app_id,
            user_id: owner,
            replicate_owner: "modelmart".to_string(),
            deployment_name: "mmart-owned".to_string(),
            hardware: "gpu-t4".to_string(),
            min_instances: 0,
            max_instances: 1,
        },
    )
    .await
    .expect("deployment seed should succeed");

    let prediction_id = format!("pred-{}", Uuid::new_v4().simple());
    RunRepo::insert(
        pool,
        &NewRun {
            deployment_id: deployment.id,
            replicate_prediction_id: prediction_id.clone(),
            status: RunStatus::Processing,
            input_payload: json!({"prompt": "a fox in the snow"}),
        },
    )
    .await
    .expect("run seed should succeed");

    prediction_id
}

/// Polling someone else's run fails with Forbidden, before the
/// provider is consulted.
#[sqlx::test(migrations = "../db/migrations")]
async fn status_poll_by_another_user_is_forbidden(pool: PgPool) {
    let owner = Uuid::new_v4();
    let prediction_id = seed_run(&pool, owner).await;

    let err = prediction::get_prediction_status(
        &pool,
        &common::dead_provider_client(),
        &prediction_id,
        Uuid::new_v4(),
    )
    .await
    .expect_err("another user's poll must be rejected");

    assert_matches!(err, AppError::Core(CoreError::Forbidden(_)));
}

/// Cancellation goes through the same ownership gate.
#[sqlx::test(migrations = "../db/migrations")]
async fn cancel_by_another_user_is_forbidden(pool: PgPool) {
    let owner = Uuid::new_v4();
    let prediction_id = seed_run(&pool, owner).await;

    let err = prediction::abort_prediction(
        &pool,
        &common::dead_provider_client(),
        &prediction_id,
        Uuid::new_v4(),
    )
    .await
    .expect_err("another user's cancel must be rejected");

    assert_matches!(err, AppError::Core(CoreError::Forbidden(_)));
}

/// A prediction id with no local run resolves to NotFound, not a
/// provider lookup.
#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_prediction_is_not_found(pool: PgPool) {
    let err = prediction::get_prediction_status(
        &pool,
        &common::dead_provider_client(),
        "pred-nonexistent",
        Uuid::new_v4(),
    )
    .await
    .expect_err("unknown prediction must be rejected");

    assert_matches!(err, AppError::Core(CoreError::NotFound { .. }));
}
