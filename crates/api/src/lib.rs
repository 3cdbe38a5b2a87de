//! HTTP service for the prediction lifecycle relay.
//!
//! Exposes the deployment and prediction surfaces over axum, with the
//! reconciliation and orchestration logic in [`services`].

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod services;
pub mod state;
