//! # Rate Limiter
//!
//! Fixed-window counter per client id. The first request of a new window
//! resets the count to 1; a request over the limit is rejected without
//! advancing the counter. The clock is passed in explicitly so the window
//! logic is deterministic under test; a wall-clock wrapper covers callers.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shared_types::{ValidationError, ValidationResult};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Rate limiter tuning.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
        }
    }
}

/// One client's current window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    /// Window start, milliseconds since the Unix epoch.
    pub start_ms: u64,
    /// Requests counted in this window.
    pub count: u32,
}

/// Fixed-window rate limiter keyed by client id.
pub struct RateLimiter {
    windows: DashMap<String, RateLimitWindow>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Limiter with the given tuning.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    /// Count a request at an explicit instant.
    pub fn check_at(&self, client_id: &str, now_ms: u64) -> ValidationResult {
        let window_ms = self.config.window.as_millis() as u64;
        let mut entry = self
            .windows
            .entry(client_id.to_string())
            .or_insert(RateLimitWindow {
                start_ms: now_ms,
                count: 0,
            });

        if now_ms.saturating_sub(entry.start_ms) >= window_ms {
            entry.start_ms = now_ms;
            entry.count = 0;
        }

        if entry.count >= self.config.max_requests {
            debug!(
                "[qb-guard] rate limit hit for {} ({}/{})",
                client_id, entry.count, self.config.max_requests
            );
            return Err(ValidationError::ResourceLimitExceeded(format!(
                "rate limit: {} requests per {:?}",
                self.config.max_requests, self.config.window
            )));
        }
        entry.count += 1;
        Ok(())
    }

    /// Count a request against the wall clock.
    pub fn check(&self, client_id: &str) -> ValidationResult {
        self.check_at(client_id, unix_now_ms())
    }

    /// Drop windows that ended before `now_ms`. Returns the number removed.
    pub fn cleanup(&self, now_ms: u64) -> usize {
        let window_ms = self.config.window.as_millis() as u64;
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now_ms.saturating_sub(w.start_ms) < window_ms);
        before - self.windows.len()
    }

    /// Periodic sweep loop, intended to be spawned once at startup.
    pub async fn run_sweeper(self: Arc<Self>, interval: Duration) {
        loop {
            tokio::time::sleep(interval).await;
            let removed = self.cleanup(unix_now_ms());
            if removed > 0 {
                debug!("[qb-guard] dropped {} stale rate windows", removed);
            }
        }
    }

    /// Number of tracked clients.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Serializable copy of the window table, for persistence.
    pub fn snapshot(&self) -> Vec<(String, RateLimitWindow)> {
        self.windows
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Replace the window table with a previously captured snapshot.
    pub fn restore(&self, windows: Vec<(String, RateLimitWindow)>) {
        self.windows.clear();
        for (client, window) in windows {
            self.windows.insert(client, window);
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
