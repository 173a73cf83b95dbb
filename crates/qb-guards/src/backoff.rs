//! # Bounded Exponential Backoff
//!
//! Retry policy for network-bound lookups (chain height, block fetch).
//! Exhausting the attempt budget surfaces the last failure; it is never
//! treated as success.

use shared_types::ValidationError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retry schedule: `base * multiplier^attempt`, capped.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Factor applied per retry.
    pub multiplier: u32,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Total attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            multiplier: 2,
            max_delay: Duration::from_secs(5),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given zero-based failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds or the attempt budget is spent. The last
    /// error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ValidationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ValidationError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = ValidationError::UpstreamUnavailable("no attempts made".into());
        for attempt in 0..attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    debug!(
                        "[qb-guard] attempt {}/{} failed: {}",
                        attempt + 1,
                        attempts,
                        err
                    );
                    last_error = err;
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.delay_for(attempt)).await;
                    }
                }
            }
        }
        Err(last_error)
    }
}
