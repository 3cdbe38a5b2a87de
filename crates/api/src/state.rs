use std::sync::Arc;

use modelmart_replicate::ReplicateClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: modelmart_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Replicate API client, constructed once at startup from
    /// immutable configuration.
    pub replicate: Arc<ReplicateClient>,
}
