//! Retry with exponential backoff
//!
//! One policy type is shared by every retry site in the crate: sitemap
//! fetches, rendered sitemap loads, the fetch-wait-extract cycle and
//! directory creation. Call sites supply the operation and a predicate that
//! decides which errors are worth another attempt.
//!
//! # Delay Calculation
//!
//! ```text
//! delay = min(base_delay * multiplier^(attempt - 1), max_delay)
//! ```
//!
//! With defaults the delays are 1s then 2s before the third and final attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default maximum attempts, including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Decision taken after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`; `attempt` is the number of the next attempt
    Retry { delay: Duration, attempt: u32 },

    /// Give up and surface the last error
    DoNotRetry { reason: String },
}

/// Bounded exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Short policy for local filesystem operations (3 attempts, 100ms base)
    pub fn filesystem() -> Self {
        Self::new(3, Duration::from_millis(100), Duration::from_secs(1))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Backoff before the attempt that follows `attempt` (1-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay_ms = self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// Decides whether a failed attempt should be retried
    ///
    /// # Arguments
    ///
    /// * `retryable` - Whether the caller classified the error as transient
    /// * `attempt` - The attempt that just failed (1-indexed)
    pub fn should_retry(&self, retryable: bool, attempt: u32) -> RetryDecision {
        if !retryable {
            return RetryDecision::DoNotRetry {
                reason: "error is not retryable".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.delay_for(attempt),
            attempt: attempt + 1,
        }
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent
    ///
    /// `op` receives the 1-indexed attempt number so callers can scale their
    /// own timeouts. The last error is returned unchanged.
    pub async fn run<T, E, F, Fut, P>(&self, operation: &str, is_retryable: P, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => match self.should_retry(is_retryable(&error), attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next,
                    } => {
                        warn!(
                            operation,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "Attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt = next;
                    }
                    RetryDecision::DoNotRetry { reason } => {
                        debug!(operation, attempt, %reason, error = %error, "Giving up");
                        return Err(error);
                    }
                },
            }
        }
    }
}
