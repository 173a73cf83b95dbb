//! # Validator Stake Check
//!
//! Sums the balances of every account under a validator's authority and
//! compares against a configured minimum. Lookup failure after retries is
//! reported as insufficient, never as a pass.

use crate::ports::AccountProvider;
use qb_guards::backoff::RetryPolicy;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::sync::Arc;
use tracing::warn;

/// Stake check tuning.
#[derive(Clone, Copy, Debug)]
pub struct StakeConfig {
    /// Minimum total stake in base units.
    pub min_stake: u64,
    /// Retry schedule for account lookups.
    pub retry: RetryPolicy,
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            min_stake: 1_000_000,
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome of a stake check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeCheck {
    /// Whether the summed stake meets the minimum.
    pub sufficient: bool,
    /// Total stake observed; zero when the lookup failed.
    pub total_stake: u64,
}

/// Checks validator stake through an account provider.
pub struct ValidatorStakeChecker {
    accounts: Arc<dyn AccountProvider>,
    config: StakeConfig,
}

impl ValidatorStakeChecker {
    /// Checker over an account provider.
    pub fn new(accounts: Arc<dyn AccountProvider>, config: StakeConfig) -> Self {
        Self { accounts, config }
    }

    /// Sum stake under `authority` and compare to the minimum. Any lookup
    /// failure after retries counts as insufficient.
    pub async fn check(&self, authority: &Address) -> StakeCheck {
        let lookup = self
            .config
            .retry
            .run(|| self.accounts.accounts_by_authority(authority))
            .await;

        match lookup {
            Ok(accounts) => {
                let total_stake = accounts
                    .iter()
                    .fold(0u64, |sum, a| sum.saturating_add(a.balance));
                StakeCheck {
                    sufficient: total_stake >= self.config.min_stake,
                    total_stake,
                }
            }
            Err(err) => {
                warn!("[qb-audit] stake lookup failed, treating as insufficient: {err}");
                StakeCheck {
                    sufficient: false,
                    total_stake: 0,
                }
            }
        }
    }
}
