//! Retry policy applied around collaborator calls.

use std::future::Future;
use std::time::Duration;

use tw_domain::config::RetryConfig;
use tw_domain::error::{Error, Result};

/// Exponential backoff with a per-attempt timeout.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub backoff_coefficient: f64,
    pub max_interval: Duration,
    pub max_attempts: u32,
    /// Start-to-close timeout applied to each individual attempt.
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(retry: &RetryConfig, call_timeout_ms: u64) -> Self {
        Self {
            initial_interval: Duration::from_millis(retry.initial_interval_ms),
            backoff_coefficient: retry.backoff_coefficient,
            max_interval: Duration::from_millis(retry.max_interval_ms),
            max_attempts: retry.max_attempts.max(1),
            call_timeout: Duration::from_millis(call_timeout_ms),
        }
    }

    fn next_interval(&self, current: Duration) -> Duration {
        let scaled = current.mul_f64(self.backoff_coefficient.max(1.0));
        scaled.min(self.max_interval)
    }
}

/// Run `op` until it succeeds, fails terminally, or the attempt budget is
/// spent.
///
/// Each attempt races against the policy's call timeout; a timed-out
/// attempt counts as a retryable failure. Errors whose
/// [`Error::is_retryable`] is false short-circuit immediately.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut interval = policy.initial_interval;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let result = match tokio::time::timeout(policy.call_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "{what}: no response within {:?}",
                policy.call_timeout
            ))),
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() {
            tracing::debug!(what, error = %err, "terminal failure, not retrying");
            return Err(err);
        }
        if attempt >= policy.max_attempts {
            tracing::warn!(what, attempts = attempt, error = %err, "retry budget exhausted");
            return Err(err);
        }

        tracing::warn!(
            what,
            attempt,
            delay_ms = interval.as_millis() as u64,
            error = %err,
            "attempt failed, retrying"
        );
        tokio::time::sleep(interval).await;
        interval = policy.next_interval(interval);
    }
}
