use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
///
/// Covers the relay's two dependencies: the run database and the
/// compute provider. The provider endpoint is reported but not called;
/// a synthetic prediction per health poll would cost real money.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status: `ok` or `degraded`.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the run database answers a trivial query.
    pub db_healthy: bool,
    /// Provider API endpoint predictions are relayed to.
    pub replicate_api: String,
}

/// GET /health -- returns service, database, and provider-wiring health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = modelmart_db::health_check(&state.pool).await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        replicate_api: state.replicate.base_url().to_string(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
