use axum::routing::{get, post};
use axum::Router;

use crate::handlers::predictions;
use crate::state::AppState;

/// Routes nested under `/predictions`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/run", post(predictions::run))
        .route("/clone-run", post(predictions::clone_run))
        .route("/{id}", get(predictions::get_status))
        .route("/{id}/cancel", post(predictions::cancel))
        .route("/{id}/stream", get(predictions::stream))
}
