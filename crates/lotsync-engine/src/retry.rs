//! Exponential backoff retry for destination writes.

use std::time::Duration;
use tracing::{debug, warn};

use crate::error::CmsError;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: u64,
    /// Maximum delay cap in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 1,
            max_delay_secs: 30,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given max retries and base delay.
    #[must_use]
    pub fn new(max_retries: u32, base_delay_secs: u64) -> Self {
        Self {
            max_retries,
            base_delay_secs,
            max_delay_secs: 30,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    /// Whether the error should be retried at the given attempt number.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &CmsError) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        error.is_retryable() || error.is_server_error()
    }

    /// Delay before the given attempt.
    ///
    /// A rate-limit response with `Retry-After` overrides the exponential
    /// schedule (capped at `max_delay_secs`).
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &CmsError) -> Duration {
        let secs = if let CmsError::RateLimited {
            retry_after_secs: Some(retry_after),
        } = error
        {
            (*retry_after).min(self.max_delay_secs)
        } else {
            let exponential = self
                .base_delay_secs
                .saturating_mul(2u64.saturating_pow(attempt));
            exponential.min(self.max_delay_secs)
        };
        Duration::from_secs(secs)
    }

    /// Execute an async operation with retry.
    ///
    /// The closure is called repeatedly until it succeeds, a non-retryable
    /// error is encountered, or retries are exhausted.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut f: F) -> Result<T, CmsError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CmsError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !self.should_retry(attempt, &error) {
                        if attempt >= self.max_retries && attempt > 0 {
                            warn!(
                                operation = operation_name,
                                attempts = attempt + 1,
                                error = %error,
                                "Max retries exceeded"
                            );
                            return Err(CmsError::MaxRetriesExceeded {
                                attempts: attempt + 1,
                                message: format!(
                                    "{operation_name} failed after {} attempt(s): {error}",
                                    attempt + 1
                                ),
                            });
                        }
                        return Err(error);
                    }

                    let delay = self.delay_for(attempt, &error);
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
