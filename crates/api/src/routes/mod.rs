//! Route table for the API.
//!
//! ```text
//! GET    /health                          service + database health (root level)
//!
//! /api/v1/deployments
//!   GET    /                              list_deployments
//!   GET    /{id}                          get_deployment
//!   DELETE /{id}                          delete_deployment (202)
//!   GET    /{id}/runs                     list_runs
//!
//! /api/v1/predictions
//!   POST   /run                           run
//!   POST   /clone-run                     clone_run
//!   GET    /{id}                          get_status
//!   POST   /{id}/cancel                   cancel
//!   GET    /{id}/stream                   stream (server-sent events)
//! ```

use axum::Router;

use crate::state::AppState;

pub mod deployments;
pub mod health;
pub mod predictions;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/deployments", deployments::router())
        .nest("/predictions", predictions::router())
}
