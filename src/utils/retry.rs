//! Retry utilities with exponential backoff for external source calls.
//!
//! Retries run inside the provider's own timeout, so a slow retry loop is cut
//! off by the engine like any other slow call.

use std::time::Duration;
use tokio::time::sleep;

use crate::config::RetryConfigFile;
use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A configuration that makes exactly one attempt
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt.saturating_sub(1) as f64);
        Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()))
    }
}

impl From<&RetryConfigFile> for RetryConfig {
    fn from(file: &RetryConfigFile) -> Self {
        Self {
            max_attempts: file.max_attempts.max(1),
            initial_delay: Duration::from_millis(file.initial_delay_ms),
            max_delay: Duration::from_millis(file.max_delay_ms),
            backoff_multiplier: Self::default().backoff_multiplier,
        }
    }
}

/// Transient errors that should trigger a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    /// Connection could not be established or was reset
    Network,
    /// The request timed out
    Timeout,
    /// The source answered with a 5xx status
    ServerError,
}

impl TransientError {
    /// Classify a SourceError. Rate limits and client errors are permanent.
    pub fn from_source_error(err: &SourceError) -> Option<Self> {
        match err {
            SourceError::Network(_) => Some(TransientError::Network),
            SourceError::Timeout(_) => Some(TransientError::Timeout),
            SourceError::Api { status, .. } if *status >= 500 => Some(TransientError::ServerError),
            _ => None,
        }
    }
}

/// Execute an async operation, retrying transient failures with backoff
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let mut attempts = 0;
    let mut operation = operation;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::debug!(attempts, "Operation succeeded after transient failures");
                }
                return Ok(result);
            }
            Err(error) => {
                let Some(transient) = TransientError::from_source_error(&error) else {
                    return Err(error);
                };

                if attempts >= config.max_attempts {
                    tracing::warn!(attempts, %error, "Giving up after transient failures");
                    return Err(error);
                }

                let delay = config.delay_for(attempts);
                tracing::debug!(
                    attempts,
                    ?transient,
                    delay_ms = delay.as_millis() as u64,
                    "Transient error, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
