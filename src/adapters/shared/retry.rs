//! Shared retry logic with exponential backoff
//!
//! Used by the gateway for idempotent REST calls and by the task broker
//! to space out task redelivery. Delays double per attempt up to a cap,
//! plus random jitter so concurrent callers do not retry in lockstep.

use std::future::Future;
use std::time::Duration;

/// Backoff schedule
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay in milliseconds (doubles each attempt)
    pub initial_delay_ms: u64,
    /// Maximum delay cap in milliseconds
    pub max_delay_ms: u64,
    /// Upper bound (exclusive) of random jitter added to each delay
    pub jitter_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            jitter_ms: 200,
        }
    }
}

impl BackoffConfig {
    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let base = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        let jitter = if self.jitter_ms > 0 {
            rand::random::<u64>() % self.jitter_ms
        } else {
            0
        };
        Duration::from_millis(base + jitter)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error,
/// or `config.max_attempts` is reached. Returns the last error.
///
/// # Example
/// ```ignore
/// let account = retry_with_backoff(&config, "GET /v2/account", GatewayError::is_retryable, || async {
///     self.fetch_account().await
/// }).await?;
/// ```
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    config: &BackoffConfig,
    operation: &str,
    is_retryable: R,
    mut attempt_fn: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < config.max_attempts && is_retryable(&e) => {
                let delay = config.delay_for(attempt);
                tracing::warn!(
                    operation = %operation,
                    attempt = attempt + 1,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
