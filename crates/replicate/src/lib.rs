//! Typed HTTP client for the Replicate prediction API.
//!
//! Provides deployment lifecycle CRUD, prediction create/get/cancel,
//! a retry policy with exponential backoff and jitter, uniform error
//! normalization, and a lazy decoder for Replicate's server-sent-event
//! output streams.

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod stream;
pub mod types;

pub use client::ReplicateClient;
pub use config::ReplicateConfig;
pub use error::ReplicateError;
pub use stream::SseEvent;
pub use types::{
    CreateDeployment, Deployment, DeploymentRef, Prediction, PredictionOptions, UpdateDeployment,
};
