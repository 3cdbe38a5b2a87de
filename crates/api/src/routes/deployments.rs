use axum::routing::get;
use axum::Router;

use crate::handlers::deployments;
use crate::state::AppState;

/// Routes nested under `/deployments`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(deployments::list_deployments))
        .route(
            "/{id}",
            get(deployments::get_deployment).delete(deployments::delete_deployment),
        )
        .route("/{id}/runs", get(deployments::list_runs))
}
