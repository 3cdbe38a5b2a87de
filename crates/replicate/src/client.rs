//! HTTP client for the Replicate REST API.
//!
//! Wraps deployment CRUD and prediction create/get/cancel using
//! [`reqwest`], with the retry policy from [`crate::retry`] applied to
//! every call and all failures normalized into [`ReplicateError`].

use std::collections::VecDeque;

use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ReplicateConfig;
use crate::error::ReplicateError;
use crate::retry::{with_retry, RetryPolicy};
use crate::stream::{SseDecoder, SseEvent};
use crate::types::{
    CreateDeployment, Deployment, DeploymentRef, Prediction, PredictionOptions, UpdateDeployment,
};

/// Client for one Replicate account.
///
/// Holds no per-call state; wrap it in an `Arc` and share it freely
/// across concurrent operations.
pub struct ReplicateClient {
    /// Pooled client with the configured per-request deadline.
    http: reqwest::Client,
    /// Separate client without a total deadline for event streams,
    /// which legitimately stay open longer than any single request.
    stream_http: reqwest::Client,
    config: ReplicateConfig,
    policy: RetryPolicy,
}

impl ReplicateClient {
    /// Build a client from immutable configuration.
    ///
    /// # Panics
    ///
    /// Panics if the underlying TLS backend cannot be initialized;
    /// this only happens at process start and is not recoverable.
    pub fn new(config: ReplicateConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build Replicate HTTP client");
        let stream_http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .expect("failed to build Replicate stream client");
        Self {
            http,
            stream_http,
            config,
            policy: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy (primarily for tests).
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The provider endpoint this client is pointed at.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // ---- deployments ----

    /// `POST /v1/deployments`
    pub async fn create_deployment(
        &self,
        req: &CreateDeployment,
    ) -> Result<Deployment, ReplicateError> {
        with_retry(&self.policy, || {
            self.request(Method::POST, "/v1/deployments", Some(req), None)
        })
        .await
    }

    /// `GET /v1/deployments/{owner}/{name}`
    pub async fn get_deployment(&self, r: &DeploymentRef) -> Result<Deployment, ReplicateError> {
        let path = format!("/v1/deployments/{}/{}", r.owner, r.name);
        with_retry(&self.policy, || {
            self.request::<Deployment, ()>(Method::GET, &path, None, None)
        })
        .await
    }

    /// `PATCH /v1/deployments/{owner}/{name}`
    pub async fn update_deployment(
        &self,
        r: &DeploymentRef,
        patch: &UpdateDeployment,
    ) -> Result<Deployment, ReplicateError> {
        let path = format!("/v1/deployments/{}/{}", r.owner, r.name);
        with_retry(&self.policy, || {
            self.request(Method::PATCH, &path, Some(patch), None)
        })
        .await
    }

    /// `DELETE /v1/deployments/{owner}/{name}` -- answers 204, so no
    /// body is parsed. Remote deletion is idempotent: a 404 means the
    /// deployment is already gone and counts as success, so a teardown
    /// retried after a partial failure does not wedge on it.
    pub async fn delete_deployment(&self, r: &DeploymentRef) -> Result<(), ReplicateError> {
        let path = format!("/v1/deployments/{}/{}", r.owner, r.name);
        let result = with_retry(&self.policy, || {
            self.request_no_content::<()>(Method::DELETE, &path, None)
        })
        .await;
        match result {
            Err(ReplicateError::Api { status: 404, .. }) => Ok(()),
            other => other,
        }
    }

    // ---- predictions ----

    /// `POST /v1/deployments/{owner}/{name}/predictions`
    pub async fn create_prediction(
        &self,
        r: &DeploymentRef,
        input: &serde_json::Value,
        opts: &PredictionOptions,
    ) -> Result<Prediction, ReplicateError> {
        let path = format!("/v1/deployments/{}/{}/predictions", r.owner, r.name);
        let body = serde_json::json!({
            "input": input,
            "stream": opts.stream,
        });
        with_retry(&self.policy, || {
            self.request(Method::POST, &path, Some(&body), opts.prefer_wait_secs)
        })
        .await
    }

    /// Submit a prediction directly against a model, bypassing any
    /// deployment.
    ///
    /// `owner/name` model references go to the model predictions
    /// endpoint; bare model names go to the generic endpoint with an
    /// optional pinned version.
    pub async fn create_generic_prediction(
        &self,
        model: &str,
        input: &serde_json::Value,
        opts: &PredictionOptions,
    ) -> Result<Prediction, ReplicateError> {
        if let Some((owner, name)) = model.split_once('/') {
            let path = format!("/v1/models/{owner}/{name}/predictions");
            let body = serde_json::json!({
                "input": input,
                "stream": opts.stream,
            });
            return with_retry(&self.policy, || {
                self.request(Method::POST, &path, Some(&body), opts.prefer_wait_secs)
            })
            .await;
        }

        let mut body = serde_json::json!({
            "model": model,
            "input": input,
            "stream": opts.stream,
        });
        if let Some(version) = &opts.version {
            body["version"] = serde_json::Value::String(version.clone());
        }
        with_retry(&self.policy, || {
            self.request(Method::POST, "/v1/predictions", Some(&body), opts.prefer_wait_secs)
        })
        .await
    }

    /// `GET /v1/predictions/{id}`
    pub async fn get_prediction(&self, id: &str) -> Result<Prediction, ReplicateError> {
        let path = format!("/v1/predictions/{id}");
        with_retry(&self.policy, || {
            self.request::<Prediction, ()>(Method::GET, &path, None, None)
        })
        .await
    }

    /// `POST /v1/predictions/{id}/cancel` -- cooperative cancellation;
    /// the provider reports the final status on a later read.
    pub async fn cancel_prediction(&self, id: &str) -> Result<Prediction, ReplicateError> {
        let path = format!("/v1/predictions/{id}/cancel");
        with_retry(&self.policy, || {
            self.request::<Prediction, ()>(Method::POST, &path, None, None)
        })
        .await
    }

    /// Open a prediction's push channel and decode it lazily.
    ///
    /// The returned stream is finite, forward-only, and not
    /// restartable: it ends when the provider closes the connection or
    /// emits its sentinel terminator. Dropping the stream releases the
    /// underlying connection. No retry applies here -- a broken stream
    /// must be re-requested by the consumer.
    pub async fn stream_prediction(
        &self,
        stream_url: &str,
    ) -> Result<impl Stream<Item = Result<SseEvent, ReplicateError>> + Send, ReplicateError> {
        let response = self
            .stream_http
            .get(stream_url)
            .bearer_auth(&self.config.api_token)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(ReplicateError::from_reqwest)?;
        let response = Self::ensure_success(response).await?;
        Ok(decode_sse(response.bytes_stream()))
    }

    // ---- private helpers ----

    /// Issue one request and parse the JSON response body.
    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        prefer_wait_secs: Option<u64>,
    ) -> Result<T, ReplicateError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(method, path, body, prefer_wait_secs).await?;
        let response = Self::ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(ReplicateError::from_reqwest)
    }

    /// Issue one request, expecting an empty (or ignorable) body.
    async fn request_no_content<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ReplicateError>
    where
        B: Serialize + ?Sized,
    {
        let response = self.send(method, path, body, None).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        prefer_wait_secs: Option<u64>,
    ) -> Result<reqwest::Response, ReplicateError>
    where
        B: Serialize + ?Sized,
    {
        let mut req = self
            .http
            .request(method, format!("{}{}", self.config.base_url, path))
            .bearer_auth(&self.config.api_token);
        if let Some(body) = body {
            req = req.json(body);
        }
        if let Some(wait) = prefer_wait_secs {
            req = req.header("Prefer", format!("wait={wait}"));
        }
        req.send().await.map_err(ReplicateError::from_reqwest)
    }

    /// Return the response unchanged on success, or normalize the
    /// provider's error payload on a non-2xx status.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ReplicateError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReplicateError::from_provider_body(status.as_u16(), &body));
        }
        Ok(response)
    }
}

/// Decode a chunked byte stream into server-sent events.
///
/// Chunks are fed through [`SseDecoder`]; the output preserves
/// provider emission order exactly. A transport error mid-stream ends
/// the sequence with a single [`ReplicateError::Stream`].
pub fn decode_sse<S, B, E>(body: S) -> impl Stream<Item = Result<SseEvent, ReplicateError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    futures::stream::try_unfold(
        (body, SseDecoder::new(), VecDeque::new()),
        |(mut body, mut decoder, mut queue)| async move {
            loop {
                if let Some(event) = queue.pop_front() {
                    return Ok(Some((event, (body, decoder, queue))));
                }
                if decoder.is_done() {
                    return Ok(None);
                }
                match body.next().await {
                    Some(Ok(chunk)) => queue.extend(decoder.feed(chunk.as_ref())),
                    Some(Err(e)) => return Err(ReplicateError::Stream(e.to_string())),
                    None => return Ok(None),
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::convert::Infallible;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_client(base_url: String, timeout: Duration) -> ReplicateClient {
        ReplicateClient::new(ReplicateConfig {
            api_token: "test-token".into(),
            base_url,
            request_timeout: timeout,
        })
    }

    /// One-shot HTTP stub: accepts a single connection, reads the
    /// request, answers with the canned response, and closes.
    async fn spawn_stub(response: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn get_prediction_parses_provider_payload() {
        let body = r#"{"id":"p1","status":"processing","urls":{}}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let base = spawn_stub(Box::leak(response.into_boxed_str())).await;

        let client = test_client(base, Duration::from_secs(5));
        let prediction = client.get_prediction("p1").await.unwrap();
        assert_eq!(prediction.id, "p1");
        assert_eq!(
            prediction.status,
            modelmart_core::status::RunStatus::Processing
        );
    }

    #[tokio::test]
    async fn not_found_is_surfaced_without_retry() {
        let body = r#"{"detail":"Not found"}"#;
        let response = format!(
            "HTTP/1.1 404 Not Found\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let base = spawn_stub(Box::leak(response.into_boxed_str())).await;

        let client = test_client(base, Duration::from_secs(5));
        let err = client.get_prediction("missing").await.unwrap_err();
        assert_matches!(err, ReplicateError::Api { status: 404, .. });
    }

    #[tokio::test]
    async fn delete_deployment_treats_missing_as_deleted() {
        let body = r#"{"detail":"Not found"}"#;
        let response = format!(
            "HTTP/1.1 404 Not Found\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let base = spawn_stub(Box::leak(response.into_boxed_str())).await;

        let client = test_client(base, Duration::from_secs(5));
        let gone = DeploymentRef::new("owner", "gone");
        assert!(client.delete_deployment(&gone).await.is_ok());
    }

    #[tokio::test]
    async fn unresponsive_provider_fails_with_timeout() {
        // Accept the connection but never answer.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(socket);
        });

        let deadline = Duration::from_millis(200);
        let client = test_client(format!("http://{addr}"), deadline);

        let started = std::time::Instant::now();
        let err = client.get_prediction("p1").await.unwrap_err();
        assert_matches!(err, ReplicateError::Timeout);
        assert!(started.elapsed() >= deadline, "failed before the deadline");

        hold.abort();
    }

    #[tokio::test]
    async fn decode_sse_relays_events_in_order_until_close() {
        let chunks: Vec<Result<&[u8], Infallible>> = vec![
            Ok(b"event: output\ndata: first\n\n"),
            Ok(b"event: output\ndata: sec"),
            Ok(b"ond\n\n"),
        ];
        let events: Vec<_> = decode_sse(futures::stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "first");
        assert_eq!(events[1].data, "second");
    }

    #[tokio::test]
    async fn decode_sse_stops_at_sentinel() {
        let chunks: Vec<Result<&[u8], Infallible>> = vec![
            Ok(b"event: output\ndata: only\n\n"),
            Ok(b"data: [DONE]\n\nevent: output\ndata: never\n\n"),
        ];
        let events: Vec<_> = decode_sse(futures::stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "only");
    }

    #[tokio::test]
    async fn decode_sse_surfaces_transport_errors() {
        let chunks: Vec<Result<&[u8], &str>> = vec![
            Ok(b"event: output\ndata: ok\n\n"),
            Err("connection reset"),
        ];
        let collected: Vec<_> = decode_sse(futures::stream::iter(chunks)).collect().await;
        assert_eq!(collected.len(), 2);
        assert!(collected[0].is_ok());
        assert_matches!(
            collected[1],
            Err(ReplicateError::Stream(ref msg)) if msg.contains("connection reset")
        );
    }
}
