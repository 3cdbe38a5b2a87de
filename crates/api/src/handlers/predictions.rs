//! Handlers for prediction lifecycle endpoints, including the live
//! event-stream relay.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::prediction;
use crate::state::AppState;

/// Request body for starting a prediction on an existing deployment.
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub deployment_id: Uuid,
    pub input: serde_json::Value,
    /// Request a push-channel URL instead of holding the response open.
    #[serde(default)]
    pub stream: bool,
}

/// Request body for the one-shot clone-and-run flow.
#[derive(Debug, Deserialize)]
pub struct CloneRunRequest {
    pub slug: String,
    pub input: serde_json::Value,
}

/// POST /predictions/run
///
/// Start a prediction on the caller's deployment.
pub async fn run(
    State(state): State<AppState>,
    AuthUser { user_id }: AuthUser,
    Json(req): Json<RunRequest>,
) -> AppResult<(
    StatusCode,
    Json<DataResponse<modelmart_replicate::types::Prediction>>,
)> {
    let prediction = prediction::run_prediction(
        &state.pool,
        &state.replicate,
        req.deployment_id,
        req.input,
        user_id,
        req.stream,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: prediction })))
}

/// POST /predictions/clone-run
///
/// Resolve an app by slug, ensure the caller has a deployment for it,
/// and start a run in one request.
pub async fn clone_run(
    State(state): State<AppState>,
    AuthUser { user_id }: AuthUser,
    Json(req): Json<CloneRunRequest>,
) -> AppResult<(
    StatusCode,
    Json<DataResponse<modelmart_replicate::types::Prediction>>,
)> {
    let prediction = prediction::clone_run(
        &state.pool,
        &state.replicate,
        &req.slug,
        req.input,
        user_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: prediction })))
}

/// GET /predictions/{id}
///
/// Fetch current prediction state from the provider and reconcile the
/// local run record if it reached a terminal state.
pub async fn get_status(
    State(state): State<AppState>,
    AuthUser { user_id }: AuthUser,
    Path(prediction_id): Path<String>,
) -> AppResult<Json<DataResponse<modelmart_replicate::types::Prediction>>> {
    let prediction =
        prediction::get_prediction_status(&state.pool, &state.replicate, &prediction_id, user_id)
            .await?;
    Ok(Json(DataResponse { data: prediction }))
}

/// POST /predictions/{id}/cancel
///
/// Request cooperative cancellation of a running prediction.
pub async fn cancel(
    State(state): State<AppState>,
    AuthUser { user_id }: AuthUser,
    Path(prediction_id): Path<String>,
) -> AppResult<Json<DataResponse<modelmart_replicate::types::Prediction>>> {
    let prediction =
        prediction::abort_prediction(&state.pool, &state.replicate, &prediction_id, user_id)
            .await?;
    Ok(Json(DataResponse { data: prediction }))
}

/// GET /predictions/{id}/stream
///
/// Relay the provider's event stream to the caller as server-sent
/// events, preserving event names and order. A provider-side failure
/// surfaces as a single `error` event; normal completion appends a
/// final `done` event. Either way the stream then closes, which drops
/// the upstream connection.
pub async fn stream(
    State(state): State<AppState>,
    AuthUser { user_id }: AuthUser,
    Path(prediction_id): Path<String>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let upstream =
        prediction::open_event_stream(&state.pool, &state.replicate, &prediction_id, user_id)
            .await?;

    let relay = futures::stream::unfold(
        (Box::pin(upstream), false),
        |(mut upstream, finished)| async move {
            if finished {
                return None;
            }
            let ((name, data), more) = relay_frame(upstream.next().await);
            let event = Event::default().event(name).data(data);
            Some((Ok(event), (upstream, !more)))
        },
    );

    Ok(Sse::new(relay).keep_alive(KeepAlive::default()))
}

/// Map one upstream item to an outgoing SSE frame `(event, data)` and
/// whether the relay keeps going afterwards.
///
/// Provider events pass through with their name and data intact. A
/// mid-stream failure becomes a single `error` frame; exhaustion
/// becomes a final `done` frame. Both end the relay.
fn relay_frame(
    item: Option<Result<modelmart_replicate::SseEvent, modelmart_replicate::ReplicateError>>,
) -> ((String, String), bool) {
    match item {
        Some(Ok(ev)) => ((ev.event, ev.data), true),
        Some(Err(err)) => {
            tracing::warn!(error = %err, "Provider event stream failed mid-relay");
            let payload = serde_json::json!({ "error": err.to_string() });
            (("error".to_string(), payload.to_string()), false)
        }
        None => {
            (
                ("done".to_string(), r#"{"status":"done"}"#.to_string()),
                false,
            )
        }
    }
}
