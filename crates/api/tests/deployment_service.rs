//! Integration tests for deployment reconciliation against a real
//! database.
//!
//! The unique constraint on (app_id, user_id) is the single arbiter
//! when two requests race to create a deployment; these tests verify
//! that both racers end up holding the same row.

mod common;

use modelmart_api::services::deployment;
use modelmart_db::repositories::DeploymentRepo;
use sqlx::PgPool;
use uuid::Uuid;

/// Two concurrent `ensure_deployment` calls for the same (app, user)
/// yield exactly one row, and both callers get its id: the insert
/// loser detects the unique violation and adopts the winner's row.
#[sqlx::test(migrations = "../db/migrations")]
async fn concurrent_ensure_yields_one_deployment(pool: PgPool) {
    let app_id = common::seed_app(&pool).await;
    let user_id = Uuid::new_v4();

    // Both racers may reach the provider, so the stub serves two creates.
    let base =
        common::spawn_provider_stub(r#"{"owner":"modelmart","name":"mmart-race"}"#, 2).await;
    let client = common::provider_client(&base);

    let (a, b) = tokio::join!(
        deployment::ensure_deployment(&pool, &client, app_id, user_id),
        deployment::ensure_deployment(&pool, &client, app_id, user_id),
    );

    let a = a.expect("first caller should get a deployment");
    let b = b.expect("second caller should get a deployment");
    assert_eq!(a.id, b.id);

    let rows = DeploymentRepo::list_for_user(&pool, user_id)
        .await
        .expect("listing should succeed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].replicate_owner, "modelmart");
    assert_eq!(rows[0].deployment_name, "mmart-race");
}

/// Once a deployment exists, `ensure_deployment` returns it from the
/// fast path without contacting the provider at all.
#[sqlx::test(migrations = "../db/migrations")]
async fn ensure_reuses_existing_row_without_provider_call(pool: PgPool) {
    let app_id = common::seed_app(&pool).await;
    let user_id = Uuid::new_v4();

    let base =
        common::spawn_provider_stub(r#"{"owner":"modelmart","name":"mmart-reuse"}"#, 1).await;
    let first = deployment::ensure_deployment(&pool, &common::provider_client(&base), app_id, user_id)
        .await
        .expect("initial creation should succeed");

    // A client pointed at a dead port proves no provider call happens.
    let second =
        deployment::ensure_deployment(&pool, &common::dead_provider_client(), app_id, user_id)
            .await
            .expect("fast path should not need the provider");

    assert_eq!(first.id, second.id);
}
