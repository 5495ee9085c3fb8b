//! Bounded retry with exponential backoff for legacy-database calls.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::LegacyError;

/// Retry policy for connection-class failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first (minimum 1)
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub backoff_factor: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 1000,
            backoff_factor: 2,
            max_backoff_ms: 10_000,
        }
    }
}

impl RetryConfig {
    /// Delay before the retry that follows failed attempt `attempt` (0-based):
    /// `backoff_ms * backoff_factor^attempt`, capped at `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponential = self.backoff_ms.saturating_mul(self.backoff_factor.saturating_pow(attempt));
        Duration::from_millis(exponential.min(self.max_backoff_ms))
    }
}

/// Run `op` until it succeeds, fails with a non-connection error, or runs out of attempts.
///
/// `op` receives the 0-based attempt number. The last error is returned when every attempt fails.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, mut op: F) -> Result<T, LegacyError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, LegacyError>>,
{
    let attempts = config.max_retries.max(1);
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_connection_error() && attempt + 1 < attempts => {
                let delay = config.backoff(attempt);
                warn!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    backoff_ms = delay.as_millis() as u64,
                    error = %e,
                    "Legacy database call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_connection_error() {
                    warn!(operation, attempts = attempt + 1, error = %e, "Legacy database call failed, giving up");
                }
                return Err(e);
            }
        }
    }
}
