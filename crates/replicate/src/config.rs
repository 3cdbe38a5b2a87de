use std::time::Duration;

/// Default per-request deadline for Replicate API calls.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default Replicate API base URL.
const DEFAULT_BASE_URL: &str = "https://api.replicate.com";

/// Immutable Replicate client configuration.
///
/// Built once at process start and injected into
/// [`ReplicateClient::new`](crate::ReplicateClient::new); never read
/// from ambient globals after construction.
#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    /// API token sent as a `Bearer` credential on every request.
    pub api_token: String,
    /// Base URL without trailing slash (default: `https://api.replicate.com`).
    pub base_url: String,
    /// Per-request deadline (default: 30s). Calls exceeding it fail
    /// with [`ReplicateError::Timeout`](crate::ReplicateError::Timeout).
    pub request_timeout: Duration,
}

impl ReplicateConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Required | Default                      |
    /// |---------------------------|----------|------------------------------|
    /// | `REPLICATE_API_TOKEN`     | **yes**  | --                           |
    /// | `REPLICATE_API_URL`       | no       | `https://api.replicate.com`  |
    /// | `REPLICATE_TIMEOUT_SECS`  | no       | `30`                         |
    ///
    /// # Panics
    ///
    /// Panics if `REPLICATE_API_TOKEN` is not set or is empty.
    pub fn from_env() -> Self {
        let api_token = std::env::var("REPLICATE_API_TOKEN")
            .expect("REPLICATE_API_TOKEN must be set in the environment");
        assert!(!api_token.is_empty(), "REPLICATE_API_TOKEN must not be empty");

        let base_url = std::env::var("REPLICATE_API_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs: u64 = std::env::var("REPLICATE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("REPLICATE_TIMEOUT_SECS must be a valid u64");

        Self {
            api_token,
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Configuration pointing at an arbitrary base URL, for tests and
    /// local provider stubs.
    pub fn for_base_url(api_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
