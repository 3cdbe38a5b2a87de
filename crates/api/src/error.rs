use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use modelmart_core::error::CoreError;
use modelmart_replicate::ReplicateError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific and
/// provider variants. Implements [`IntoResponse`] to produce
/// consistent JSON error responses; the per-request correlation id is
/// carried by the `x-request-id` header the middleware stack attaches
/// to every response.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `modelmart_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A failure reported by (or while reaching) the compute provider.
    #[error(transparent)]
    Replicate(#[from] ReplicateError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The prediction has no push channel to relay.
    #[error("No event stream is available for this prediction")]
    StreamUnavailable,

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = classify(&self);

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map an [`AppError`] to an HTTP status, stable machine-readable
/// code, and user-facing message.
fn classify(err: &AppError) -> (StatusCode, &'static str, String) {
    match err {
        // --- CoreError variants ---
        AppError::Core(core) => match core {
            CoreError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),
            CoreError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            CoreError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            CoreError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal core error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        },

        // --- Database errors ---
        AppError::Database(err) => classify_sqlx_error(err),

        // --- Provider errors ---
        AppError::Replicate(err) => classify_replicate_error(err),

        // --- HTTP-specific errors ---
        AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        AppError::StreamUnavailable => (
            StatusCode::NOT_FOUND,
            "STREAM_UNAVAILABLE",
            "No event stream is available for this prediction".to_string(),
        ),
        AppError::InternalError(msg) => {
            tracing::error!(error = %msg, "Internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a provider error.
///
/// Provider timeouts become 504 (we never heard back); everything the
/// provider itself reported becomes 502 with its status folded into
/// the message, since from the caller's perspective the upstream
/// failed, not this service.
fn classify_replicate_error(err: &ReplicateError) -> (StatusCode, &'static str, String) {
    match err {
        ReplicateError::Timeout => (
            StatusCode::GATEWAY_TIMEOUT,
            "PROVIDER_TIMEOUT",
            "The compute provider did not respond in time".to_string(),
        ),
        ReplicateError::Api {
            status, message, ..
        } => (
            StatusCode::BAD_GATEWAY,
            "PROVIDER_ERROR",
            format!("Provider error ({status}): {message}"),
        ),
        ReplicateError::Transport(msg) | ReplicateError::Stream(msg) => {
            tracing::error!(error = %msg, "Provider transport error");
            (
                StatusCode::BAD_GATEWAY,
                "PROVIDER_ERROR",
                "Failed to reach the compute provider".to_string(),
            )
        }
    }
}
