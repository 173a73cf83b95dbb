//! # Outbound Ports
//!
//! Block and account lookups consumed by the auditor. Both are retryable;
//! the mocks script failures the same way the guards' height mock does.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{AccountState, Address, BlockHeight, BridgeBlock, ValidationError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Fetches blocks from the audited chain.
#[async_trait]
pub trait BlockProvider: Send + Sync {
    /// Block at the given height.
    async fn block_at(&self, height: BlockHeight) -> Result<BridgeBlock, ValidationError>;
}

/// Fetches account snapshots for the stake check.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// All accounts whose authority matches `authority`.
    async fn accounts_by_authority(
        &self,
        authority: &Address,
    ) -> Result<Vec<AccountState>, ValidationError>;
}

/// In-memory block source with scriptable failures.
#[derive(Default)]
pub struct MockBlockProvider {
    blocks: Mutex<HashMap<BlockHeight, BridgeBlock>>,
    failures_remaining: AtomicU32,
}

impl MockBlockProvider {
    /// Empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a block under its height.
    pub fn insert(&self, block: BridgeBlock) {
        self.blocks.lock().insert(block.height, block);
    }

    /// Fail the next `count` fetches before succeeding again.
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlockProvider for MockBlockProvider {
    async fn block_at(&self, height: BlockHeight) -> Result<BridgeBlock, ValidationError> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(ValidationError::UpstreamUnavailable(
                "block fetch failed".into(),
            ));
        }
        self.blocks
            .lock()
            .get(&height)
            .cloned()
            .ok_or_else(|| ValidationError::UpstreamUnavailable(format!("no block at {height}")))
    }
}

/// In-memory account source with scriptable failures.
#[derive(Default)]
pub struct MockAccountProvider {
    accounts: Mutex<Vec<AccountState>>,
    failures_remaining: AtomicU32,
}

impl MockAccountProvider {
    /// Empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account snapshot.
    pub fn insert(&self, account: AccountState) {
        self.accounts.lock().push(account);
    }

    /// Fail the next `count` lookups before succeeding again.
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountProvider for MockAccountProvider {
    async fn accounts_by_authority(
        &self,
        authority: &Address,
    ) -> Result<Vec<AccountState>, ValidationError> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(ValidationError::UpstreamUnavailable(
                "account lookup failed".into(),
            ));
        }
        Ok(self
            .accounts
            .lock()
            .iter()
            .filter(|a| &a.authority == authority)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(height: BlockHeight) -> BridgeBlock {
        BridgeBlock {
            height,
            hash: [height as u8; 32],
            parent_hash: [0u8; 32],
            timestamp: 1_700_000_000,
            transactions: vec![],
        }
    }

    #[tokio::test]
    async fn test_block_mock_serves_and_fails() {
        let provider = MockBlockProvider::new();
        provider.insert(block(5));
        assert_eq!(provider.block_at(5).await.unwrap().height, 5);
        assert!(provider.block_at(6).await.is_err());

        provider.fail_next(1);
        assert!(provider.block_at(5).await.is_err());
        assert!(provider.block_at(5).await.is_ok());
    }

    #[tokio::test]
    async fn test_account_mock_filters_by_authority() {
        let provider = MockAccountProvider::new();
        provider.insert(AccountState {
            address: [1u8; 20],
            balance: 100,
            authority: [9u8; 20],
        });
        provider.insert(AccountState {
            address: [2u8; 20],
            balance: 50,
            authority: [8u8; 20],
        });
        let accounts = provider.accounts_by_authority(&[9u8; 20]).await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, 100);
    }
}
