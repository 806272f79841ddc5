//! Retry with exponential backoff for provider calls.
//!
//! Only transient overload is retried. Anything else propagates on the first
//! failure so that client errors are never hidden behind retry latency.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::provider::ProviderError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further failure
    pub initial_delay: Duration,
    /// Optional limit on a single attempt
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            attempt_timeout: None,
        }
    }
}

impl RetryConfig {
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = Some(limit);
        self
    }

    /// Backoff after the failed attempt `attempt` (0-indexed): `initial_delay * 2^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Substrings that mark a provider error as temporary overload.
///
/// `503` and `UNAVAILABLE` are matched as written; `overloaded` is matched
/// case-insensitively.
pub const TRANSIENT_MARKERS: [&str; 3] = ["503", "UNAVAILABLE", "overloaded"];

/// Check whether an error message signals transient provider overload
pub fn is_transient_message(message: &str) -> bool {
    message.contains(TRANSIENT_MARKERS[0])
        || message.contains(TRANSIENT_MARKERS[1])
        || message.to_lowercase().contains(TRANSIENT_MARKERS[2])
}

/// Check whether a provider error should be retried
pub fn is_transient(error: &ProviderError) -> bool {
    is_transient_message(&error.to_string())
}

/// One failed attempt, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 0-indexed attempt number
    pub attempt: u32,
    /// Backoff slept before the next attempt, `None` if no retry followed
    pub delay: Option<Duration>,
    /// Whether the error was classified as transient
    pub transient: bool,
}

/// Terminal failure of a retried operation
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// Every attempt hit transient overload
    #[error("provider unavailable after {attempts} attempts")]
    Exhausted { attempts: u32, last: ProviderError },

    /// A non-transient error, returned as soon as it occurred
    #[error(transparent)]
    Permanent(ProviderError),
}

/// Result of [`with_retry_detailed`]
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, RetryError>,
    pub attempts: Vec<RetryAttempt>,
}

/// Execute an async operation with retry logic
///
/// # Arguments
///
/// * `config` - Retry configuration
/// * `operation` - Produces one provider call per invocation
///
/// # Returns
///
/// The first successful result, [`RetryError::Permanent`] on a non-transient
/// error, or [`RetryError::Exhausted`] once all attempts failed transiently
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    with_retry_detailed(config, operation).await.result
}

/// Execute an async operation with retry logic, also returning the attempt log
pub async fn with_retry_detailed<T, F, Fut>(config: RetryConfig, mut operation: F) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempts = Vec::new();
    let mut attempt = 0;

    loop {
        let outcome = match config.attempt_timeout {
            Some(limit) => match timeout(limit, operation()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ProviderError::Timeout(limit)),
            },
            None => operation().await,
        };

        let error = match outcome {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(
                        "Provider call succeeded on attempt {} after {} transient failures",
                        attempt + 1,
                        attempt
                    );
                }
                return RetryOutcome {
                    result: Ok(value),
                    attempts,
                };
            }
            Err(error) => error,
        };

        let transient = is_transient(&error);

        if !transient {
            attempts.push(RetryAttempt {
                attempt,
                delay: None,
                transient,
            });
            return RetryOutcome {
                result: Err(RetryError::Permanent(error)),
                attempts,
            };
        }

        if attempt + 1 >= max_attempts {
            tracing::warn!(
                "Provider call failed after {} attempts: {}",
                attempt + 1,
                error
            );
            attempts.push(RetryAttempt {
                attempt,
                delay: None,
                transient,
            });
            return RetryOutcome {
                result: Err(RetryError::Exhausted {
                    attempts: attempt + 1,
                    last: error,
                }),
                attempts,
            };
        }

        let delay = config.delay_for(attempt);
        tracing::debug!(
            "Transient error on attempt {}: {}, retrying in {:?}",
            attempt + 1,
            error,
            delay
        );
        attempts.push(RetryAttempt {
            attempt,
            delay: Some(delay),
            transient,
        });

        sleep(delay).await;
        attempt += 1;
    }
}
