//! # Double-Spend Guard
//!
//! All-or-nothing marking of consumed inputs. A transaction's whole input
//! list is checked and inserted under one critical section; if any input
//! was already spent, none are marked. The spent set only grows within a
//! process lifetime.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{Hash, ValidationError, ValidationResult};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

/// Serializable spent-set snapshot.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpentOutputSnapshot(#[serde_as(as = "Vec<Bytes>")] pub Vec<Hash>);

/// Tracks consumed input references.
pub struct DoubleSpendGuard {
    spent: Mutex<HashSet<Hash>>,
    lock_timeout: Duration,
}

impl DoubleSpendGuard {
    /// Guard with the default 5s lock bound.
    pub fn new() -> Self {
        Self::with_lock_timeout(Duration::from_secs(5))
    }

    /// Guard with an explicit lock bound.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            spent: Mutex::new(HashSet::new()),
            lock_timeout,
        }
    }

    /// Check and mark a transaction's inputs atomically.
    ///
    /// Rejects if any input is already spent or the same input appears
    /// twice in the list; in both cases no input is marked.
    pub async fn check_and_mark(&self, inputs: &[Hash]) -> ValidationResult {
        if inputs.is_empty() {
            return Ok(());
        }

        let mut spent = timeout(self.lock_timeout, self.spent.lock())
            .await
            .map_err(|_| ValidationError::LockTimeout)?;

        let mut batch: HashSet<&Hash> = HashSet::with_capacity(inputs.len());
        for input in inputs {
            if spent.contains(input) || !batch.insert(input) {
                debug!("[qb-guard] double-spend attempt on input {:02x?}", &input[..4]);
                return Err(ValidationError::DoubleSpend);
            }
        }
        for input in inputs {
            spent.insert(*input);
        }
        Ok(())
    }

    /// Whether a single input has been marked spent.
    pub async fn is_spent(&self, input: &Hash) -> bool {
        self.spent.lock().await.contains(input)
    }

    /// Number of spent inputs.
    pub async fn len(&self) -> usize {
        self.spent.lock().await.len()
    }

    /// Whether nothing has been spent yet.
    pub async fn is_empty(&self) -> bool {
        self.spent.lock().await.is_empty()
    }

    /// Serializable copy of the spent set, for persistence.
    pub async fn snapshot(&self) -> SpentOutputSnapshot {
        SpentOutputSnapshot(self.spent.lock().await.iter().copied().collect())
    }

    /// Replace the spent set with a previously captured snapshot.
    pub async fn restore(&self, snapshot: SpentOutputSnapshot) {
        let mut spent = self.spent.lock().await;
        spent.clear();
        spent.extend(snapshot.0);
    }
}

impl Default for DoubleSpendGuard {
    fn default() -> Self {
        Self::new()
    }
}
