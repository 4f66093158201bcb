//! Retry with exponential backoff.

use std::future::Future;
use tokio::time::Duration;

/// Retry policy with exponential backoff between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Backoff multiplier applied per subsequent attempt.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Returns the backoff delay before the given attempt (1-based).
    /// Attempt 1 has no delay.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.base_delay * self.multiplier.saturating_pow(attempt - 2)
    }

    /// Runs `operation` until it succeeds or attempts are exhausted,
    /// sleeping the backoff delay between attempts. Returns the last
    /// error when all attempts fail.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let delay = self.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt < attempts {
                        tracing::debug!(attempt, error = %err, "attempt failed, retrying");
                    }
                    last_error = Some(err);
                }
            }
        }

        // attempts >= 1, so at least one error was recorded.
        Err(last_error.expect("at least one attempt"))
    }
}
