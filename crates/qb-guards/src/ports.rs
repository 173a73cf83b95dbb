//! # Outbound Ports
//!
//! The guards only talk to the chain through these traits; production
//! adapters live with the node-facing plumbing, and the mocks here drive
//! the test suites.

use async_trait::async_trait;
use shared_types::{BlockHeight, ValidationError};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Source of the audited chain's current height.
#[async_trait]
pub trait ChainHeightProvider: Send + Sync {
    /// Current chain height. Transient failures are retried by callers.
    async fn current_height(&self) -> Result<BlockHeight, ValidationError>;
}

/// In-memory height provider with scriptable failures.
pub struct MockChainHeightProvider {
    height: AtomicU64,
    failures_remaining: AtomicU32,
    calls: AtomicU64,
}

impl MockChainHeightProvider {
    /// Provider that always returns `height`.
    pub fn new(height: BlockHeight) -> Self {
        Self {
            height: AtomicU64::new(height),
            failures_remaining: AtomicU32::new(0),
            calls: AtomicU64::new(0),
        }
    }

    /// Update the reported height.
    pub fn set_height(&self, height: BlockHeight) {
        self.height.store(height, Ordering::SeqCst);
    }

    /// Fail the next `count` calls before succeeding again.
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Number of calls observed.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainHeightProvider for MockChainHeightProvider {
    async fn current_height(&self) -> Result<BlockHeight, ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(ValidationError::UpstreamUnavailable(
                "height lookup failed".into(),
            ));
        }
        Ok(self.height.load(Ordering::SeqCst))
    }
}
