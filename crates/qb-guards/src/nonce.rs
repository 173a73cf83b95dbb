//! # Nonce / Replay Guard
//!
//! Single-use nonce registration. The check and the insert share one
//! critical section, so two concurrent submissions of the same nonce can
//! never both pass. Entries expire after a configured number of blocks and
//! are removed by a periodic sweep.

use crate::backoff::RetryPolicy;
use crate::ports::ChainHeightProvider;
use serde::{Deserialize, Serialize};
use shared_types::{BlockHeight, ValidationError, ValidationResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

/// Nonce guard tuning.
#[derive(Clone, Copy, Debug)]
pub struct NonceGuardConfig {
    /// Bounded wait for the guard's critical section.
    pub lock_timeout: Duration,
    /// Blocks after which a registered nonce may be purged.
    pub expiry_blocks: u64,
    /// Soft cap on live entries; exceeding it evicts the older half.
    pub max_entries: usize,
    /// Retry schedule for height lookups.
    pub retry: RetryPolicy,
}

impl Default for NonceGuardConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            expiry_blocks: 100,
            max_entries: 10_000,
            retry: RetryPolicy::default(),
        }
    }
}

/// One registered nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
    /// The nonce value.
    pub nonce: u64,
    /// Height at registration time.
    pub issued_at: BlockHeight,
    /// Height after which the record is purgeable.
    pub expires_at: BlockHeight,
}

/// Replay protection over a nonce registry.
pub struct NonceGuard {
    records: Mutex<HashMap<u64, NonceRecord>>,
    provider: Arc<dyn ChainHeightProvider>,
    config: NonceGuardConfig,
}

impl NonceGuard {
    /// Guard over a height provider with the given tuning.
    pub fn new(provider: Arc<dyn ChainHeightProvider>, config: NonceGuardConfig) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            provider,
            config,
        }
    }

    /// Register a nonce, rejecting a value seen before.
    ///
    /// The height lookup happens outside the critical section; the
    /// check-then-insert inside it is all-or-nothing, so a lock timeout
    /// leaves no partial registration behind.
    pub async fn verify_and_register(&self, nonce: u64) -> ValidationResult {
        let height = self
            .config
            .retry
            .run(|| self.provider.current_height())
            .await?;

        let mut records = timeout(self.config.lock_timeout, self.records.lock())
            .await
            .map_err(|_| ValidationError::LockTimeout)?;

        if records.contains_key(&nonce) {
            debug!("[qb-guard] replayed nonce {}", nonce);
            return Err(ValidationError::Replay(nonce));
        }
        records.insert(
            nonce,
            NonceRecord {
                nonce,
                issued_at: height,
                expires_at: height + self.config.expiry_blocks,
            },
        );

        if records.len() > self.config.max_entries {
            evict_older_half(&mut records);
        }
        Ok(())
    }

    /// Drop records whose expiry height has passed. Returns the number
    /// purged.
    pub async fn purge_expired(&self) -> Result<usize, ValidationError> {
        let height = self
            .config
            .retry
            .run(|| self.provider.current_height())
            .await?;

        let mut records = timeout(self.config.lock_timeout, self.records.lock())
            .await
            .map_err(|_| ValidationError::LockTimeout)?;
        let before = records.len();
        records.retain(|_, record| record.expires_at > height);
        let purged = before - records.len();
        if purged > 0 {
            info!("[qb-guard] purged {} expired nonces", purged);
        }
        Ok(purged)
    }

    /// Periodic sweep loop, intended to be spawned once at startup.
    pub async fn run_sweeper(self: Arc<Self>, interval: Duration) {
        loop {
            tokio::time::sleep(interval).await;
            // Upstream failures just skip a sweep; the next tick retries.
            let _ = self.purge_expired().await;
        }
    }

    /// Number of live records.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Serializable copy of the registry, for persistence.
    pub async fn snapshot(&self) -> Vec<NonceRecord> {
        self.records.lock().await.values().copied().collect()
    }

    /// Replace the registry with a previously captured snapshot.
    pub async fn restore(&self, records: Vec<NonceRecord>) {
        let mut live = self.records.lock().await;
        live.clear();
        for record in records {
            live.insert(record.nonce, record);
        }
    }
}

/// Keep the newer half of the registry by issue height.
fn evict_older_half(records: &mut HashMap<u64, NonceRecord>) {
    let mut by_age: Vec<NonceRecord> = records.values().copied().collect();
    by_age.sort_by_key(|r| r.issued_at);
    let cutoff = by_age.len() / 2;
    for record in &by_age[..cutoff] {
        records.remove(&record.nonce);
    }
    debug!("[qb-guard] nonce registry evicted {} older entries", cutoff);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockChainHeightProvider;

    fn guard_at(height: BlockHeight, config: NonceGuardConfig) -> (Arc<MockChainHeightProvider>, NonceGuard) {
        let provider = Arc::new(MockChainHeightProvider::new(height));
        let guard = NonceGuard::new(Arc::clone(&provider) as Arc<dyn ChainHeightProvider>, config);
        (provider, guard)
    }

    #[tokio::test]
    async fn test_first_use_passes_second_is_replay() {
        let (_, guard) = guard_at(50, NonceGuardConfig::default());
        guard.verify_and_register(7).await.unwrap();
        assert_eq!(
            guard.verify_and_register(7).await,
            Err(ValidationError::Replay(7))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_height_failure_exhaustion_fails_closed() {
        let (provider, guard) = guard_at(50, NonceGuardConfig::default());
        provider.fail_next(10);
        assert!(matches!(
            guard.verify_and_register(1).await,
            Err(ValidationError::UpstreamUnavailable(_))
        ));
        // Nothing was registered by the failed attempt.
        assert!(guard.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_height_failure_recovers() {
        let (provider, guard) = guard_at(50, NonceGuardConfig::default());
        provider.fail_next(2);
        guard.verify_and_register(1).await.unwrap();
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_contended_lock_fails_closed_within_bound() {
        let config = NonceGuardConfig {
            lock_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let (_, guard) = guard_at(50, config);

        // While another holder pins the critical section, registration
        // fails with LockTimeout instead of waiting forever, and leaves
        // no partial state behind.
        let held = guard.records.lock().await;
        assert_eq!(
            guard.verify_and_register(1).await,
            Err(ValidationError::LockTimeout)
        );
        drop(held);
        assert!(guard.is_empty().await);
        guard.verify_and_register(1).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired() {
        let config = NonceGuardConfig {
            expiry_blocks: 10,
            ..Default::default()
        };
        let (provider, guard) = guard_at(100, config);
        guard.verify_and_register(1).await.unwrap();
        provider.set_height(105);
        guard.verify_and_register(2).await.unwrap();

        // Height 111: nonce 1 expired at 110, nonce 2 lives until 115.
        provider.set_height(111);
        assert_eq!(guard.purge_expired().await.unwrap(), 1);
        assert_eq!(guard.len().await, 1);
        assert_eq!(
            guard.verify_and_register(2).await,
            Err(ValidationError::Replay(2))
        );
    }

    #[tokio::test]
    async fn test_capacity_evicts_older_half() {
        let config = NonceGuardConfig {
            max_entries: 4,
            ..Default::default()
        };
        let (provider, guard) = guard_at(1, config);
        for nonce in 0..5u64 {
            provider.set_height(nonce + 1);
            guard.verify_and_register(nonce).await.unwrap();
        }
        // Five inserts tripped one eviction of the older half.
        assert_eq!(guard.len().await, 3);
        // The newest nonce survived.
        assert_eq!(
            guard.verify_and_register(4).await,
            Err(ValidationError::Replay(4))
        );
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip() {
        let (_, guard) = guard_at(50, NonceGuardConfig::default());
        guard.verify_and_register(1).await.unwrap();
        guard.verify_and_register(2).await.unwrap();

        let json = serde_json::to_string(&guard.snapshot().await).unwrap();
        let decoded: Vec<NonceRecord> = serde_json::from_str(&json).unwrap();

        let (_, restored) = guard_at(50, NonceGuardConfig::default());
        restored.restore(decoded).await;
        assert_eq!(
            restored.verify_and_register(1).await,
            Err(ValidationError::Replay(1))
        );
    }
}
