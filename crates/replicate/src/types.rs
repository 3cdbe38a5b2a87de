//! Request and response types for the Replicate API.

use modelmart_core::reconcile::RemoteSnapshot;
use modelmart_core::status::RunStatus;
use modelmart_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Addressable reference to a deployment: `(owner, name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRef {
    pub owner: String,
    pub name: String,
}

impl DeploymentRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

/// Body for `POST /v1/deployments`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDeployment {
    pub name: String,
    /// Model reference in `owner/name` form.
    pub model: String,
    /// Model version id to pin the deployment to.
    pub version: String,
    /// Hardware class, e.g. `gpu-t4`.
    pub hardware: String,
    pub min_instances: i32,
    pub max_instances: i32,
}

/// Patch body for `PATCH /v1/deployments/{owner}/{name}`.
///
/// Name and model are immutable on the provider side, so only
/// version, hardware, and scaling bounds can change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateDeployment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_instances: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_instances: Option<i32>,
}

/// A deployment as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub owner: String,
    pub name: String,
    /// Release metadata (model, version, hardware, scaling). Kept as
    /// raw JSON; only the UI surfaces it and its shape shifts often.
    #[serde(default)]
    pub current_release: Option<serde_json::Value>,
}

/// Options for prediction creation.
#[derive(Debug, Clone, Default)]
pub struct PredictionOptions {
    /// Ask the provider to hold the response open until completion or
    /// this many seconds, via the `Prefer: wait=N` header.
    pub prefer_wait_secs: Option<u64>,
    /// Request a push-channel URL in the response.
    pub stream: bool,
    /// Explicit model version (generic predictions only).
    pub version: Option<String>,
}

/// URLs attached to a prediction by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
    #[serde(default)]
    pub cancel: Option<String>,
    /// Push-channel URL; absent when the model does not support
    /// streaming or the job has not started.
    #[serde(default)]
    pub stream: Option<String>,
}

/// Provider-reported timing metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionMetrics {
    #[serde(default)]
    pub predict_time: Option<f64>,
}

/// The provider-side authoritative record of one inference job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub urls: PredictionUrls,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    pub status: RunStatus,
    #[serde(default)]
    pub input: Option<serde_json::Value>,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub logs: Option<String>,
    #[serde(default)]
    pub metrics: PredictionMetrics,
}

impl Prediction {
    /// The reconciliation-relevant subset of this prediction.
    pub fn snapshot(&self) -> RemoteSnapshot {
        RemoteSnapshot {
            status: self.status,
            output: self.output.clone(),
            error: self.error.clone(),
            completed_at: self.completed_at,
            predict_time_secs: self.metrics.predict_time,
        }
    }
}
