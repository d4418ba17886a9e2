//! Retry policy for remote store calls.
//!
//! Attempts are bounded, each attempt runs under a deadline, and only transient
//! failures are retried. Delays grow exponentially (base, 2x base, 4x base, ...)
//! up to a cap.

use crate::store::StoreError;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Retry settings, loadable from the `[coordinator.retry]` table of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound for any single delay in milliseconds
    pub max_delay_ms: u64,
    /// Deadline for one attempt in milliseconds
    pub attempt_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            attempt_timeout_ms: 10_000,
        }
    }
}

/// The last error seen once the policy stops retrying.
#[derive(Debug)]
pub struct RetryFailure {
    /// Attempts made before giving up
    pub attempts: u32,
    /// Error from the final attempt
    pub error: StoreError,
}

impl RetryPolicy {
    /// Attempts clamped to at least one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Deadline applied to each attempt.
    #[must_use]
    pub const fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let millis = self.base_delay_ms.saturating_mul(1 << exponent);
        Duration::from_millis(millis.min(self.max_delay_ms))
    }

    /// Whether a failed attempt number `attempt` (1-based) is followed by another.
    #[must_use]
    pub fn should_retry(&self, error: &StoreError, attempt: u32) -> bool {
        error.is_transient() && attempt < self.attempts()
    }

    /// Runs one attempt of `operation` under the attempt deadline. An elapsed
    /// deadline becomes a transient [`StoreError::Timeout`].
    pub async fn attempt<T, Fut>(&self, label: &str, operation: Fut) -> Result<T, StoreError>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        match timeout(self.attempt_timeout(), operation).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation: label.to_string(),
                duration_ms: self.attempt_timeout_ms,
            }),
        }
    }

    /// Calls `operation` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, RetryFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 1;

        loop {
            match self.attempt(label, operation()).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = label, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) if self.should_retry(&error, attempt) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        operation = label,
                        attempt,
                        max_attempts = self.attempts(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transient failure, retrying: {}",
                        error
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Err(RetryFailure {
                        attempts: attempt,
                        error,
                    });
                }
            }
        }
    }
}
