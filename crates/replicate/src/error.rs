//! Uniform error shape for all Replicate interactions.
//!
//! Every failure the client can surface is normalized into one of the
//! [`ReplicateError`] variants so callers never see raw transport
//! errors or unparsed provider payloads.

/// Fallback error code when the provider payload carries none.
const GENERIC_CODE: &str = "REPLICATE_ERROR";

#[derive(Debug, thiserror::Error)]
pub enum ReplicateError {
    /// The request exceeded the configured deadline. Distinct from
    /// provider-reported errors: the provider never answered.
    #[error("Replicate request timed out")]
    Timeout,

    /// The provider answered with a non-2xx status.
    #[error("Replicate API error ({status}) {code}: {message}")]
    Api {
        /// HTTP status code reported by the provider.
        status: u16,
        /// Machine-readable error code from the payload, or
        /// `REPLICATE_ERROR` when absent.
        code: String,
        /// Human-readable message.
        message: String,
        /// The raw provider payload, when it was parseable JSON.
        details: Option<serde_json::Value>,
    },

    /// The request never completed (DNS, TLS, connection reset, ...).
    #[error("Replicate transport error: {0}")]
    Transport(String),

    /// An established event stream failed mid-flight.
    #[error("Replicate stream error: {0}")]
    Stream(String),
}

impl ReplicateError {
    /// Map a [`reqwest::Error`] into the normalized shape.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReplicateError::Timeout
        } else if err.is_decode() {
            ReplicateError::Transport(format!("response decode failed: {err}"))
        } else {
            ReplicateError::Transport(err.to_string())
        }
    }

    /// Build an [`ReplicateError::Api`] from a provider response body.
    ///
    /// Replicate error payloads are loosely shaped (`detail`, `title`,
    /// sometimes `code`); unknown shapes keep the raw body as the
    /// message so nothing is lost.
    pub fn from_provider_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(payload) => {
                let code = payload
                    .get("code")
                    .and_then(|v| v.as_str())
                    .unwrap_or(GENERIC_CODE)
                    .to_string();
                let message = payload
                    .get("message")
                    .or_else(|| payload.get("detail"))
                    .or_else(|| payload.get("title"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown provider error")
                    .to_string();
                ReplicateError::Api {
                    status,
                    code,
                    message,
                    details: Some(payload),
                }
            }
            Err(_) => ReplicateError::Api {
                status,
                code: GENERIC_CODE.to_string(),
                message: if body.is_empty() {
                    "Unknown provider error".to_string()
                } else {
                    body.to_string()
                },
                details: None,
            },
        }
    }

    /// HTTP status carried by provider-reported errors, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ReplicateError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
