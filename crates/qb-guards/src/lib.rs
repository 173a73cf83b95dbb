//! # Quantum-Bridge Guards
//!
//! The stateful checks consulted during transfer verification: replay
//! protection, double-spend detection, rate limiting, and state-transition
//! validation.
//!
//! ## Concurrency Discipline
//!
//! Each guard owns its own critical section, so unrelated validations
//! proceed concurrently. Lock acquisition is bounded (default 5s) and a
//! timeout reports [`shared_types::ValidationError::LockTimeout`], which
//! callers treat exactly like a validation failure. Network-bound lookups
//! retry with bounded exponential backoff and fail closed on exhaustion.

#![warn(missing_docs)]

pub mod backoff;
pub mod double_spend;
pub mod nonce;
pub mod ports;
pub mod rate_limit;
pub mod state_transition;

pub use backoff::RetryPolicy;
pub use double_spend::{DoubleSpendGuard, SpentOutputSnapshot};
pub use nonce::{NonceGuard, NonceGuardConfig, NonceRecord};
pub use ports::{ChainHeightProvider, MockChainHeightProvider};
pub use rate_limit::{RateLimitConfig, RateLimitWindow, RateLimiter};
pub use state_transition::{
    StateTransitionGuard, TransferState, STATE_TRANSITION_TAG,
};
