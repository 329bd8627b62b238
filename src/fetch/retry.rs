//! Bounded retry with exponential backoff around a [`PageFetcher`].

use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::traits::{FetchError, PageFetcher, TransportError};

/// Attempt budget and backoff curve for page fetches.
///
/// The wait before retry `n` (1-based) is `multiplier * 2^(n-1)` seconds,
/// clamped to `[min_backoff, max_backoff]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    pub multiplier: f64,

    pub min_backoff: Duration,

    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            multiplier: 0.75,
            min_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(6),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries immediately; handy for tests and local mirrors.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier: 0.0,
            min_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay to wait after the `failed_attempt`-th failure.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(30) as i32;
        let secs = self.multiplier * 2f64.powi(exponent);
        let min = self.min_backoff.as_secs_f64();
        let max = self.max_backoff.as_secs_f64().max(min);
        Duration::from_secs_f64(secs.clamp(min, max))
    }
}

/// Wraps a transport with per-attempt timeouts and retries.
pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl<F: PageFetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            attempt_timeout: Duration::from_secs(30),
        }
    }

    /// Upper bound for a single attempt; an expired attempt counts as a
    /// transient failure.
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Fetches `url`, retrying any transport failure until the budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] carrying the last transport error once every
    /// attempt has failed.
    pub async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let outcome = match timeout(self.attempt_timeout, self.inner.fetch(url)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout {
                    secs: self.attempt_timeout.as_secs(),
                }),
            };

            match outcome {
                Ok(body) => {
                    debug!(url, attempt, bytes = body.len(), "Fetched page");
                    return Ok(body);
                }
                Err(e) if attempt < max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        url,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Fetch failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    return Err(FetchError {
                        url: url.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}
