//! Retry policy for Replicate API calls.
//!
//! Only the provider's "too many requests" status (429) is retryable.
//! Other 4xx responses are caller errors and 5xx responses are not
//! retried either; both surface immediately. Retries back off
//! exponentially with random jitter so concurrent callers do not
//! re-converge on the provider in lockstep.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ReplicateError;

/// HTTP statuses that trigger a retry.
pub const RETRYABLE_STATUSES: [u16; 1] = [429];

/// Tunable parameters for the retry strategy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
    /// Upper bound (exclusive) on the random jitter added per retry.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Whether the given error warrants another attempt.
    pub fn is_retryable(&self, err: &ReplicateError) -> bool {
        matches!(err.http_status(), Some(status) if RETRYABLE_STATUSES.contains(&status))
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`
    /// plus uniform jitter in `[0, max_jitter)`.
    ///
    /// Because the exponential step is at least as large as the jitter
    /// bound, delays are non-decreasing across consecutive retries.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry));
        exp + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

/// Run `op`, retrying per `policy` on retryable errors.
///
/// The operation closure is re-invoked from scratch on every attempt,
/// so it must rebuild its request each time.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ReplicateError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReplicateError>>,
{
    let mut retry = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if retry < policy.max_retries && policy.is_retryable(&err) => {
                let delay = policy.backoff_delay(retry);
                tracing::warn!(
                    retry = retry + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying Replicate request",
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
