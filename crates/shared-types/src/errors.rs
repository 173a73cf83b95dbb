//! # Validation Error Kinds
//!
//! The single cross-cutting error vocabulary of the trust core. Guards never
//! panic or throw past their boundary; they return one of these kinds and the
//! auditor aggregates them into a per-transaction verdict.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed validation failure reported by guards, the proof format, and the
/// block auditor.
///
/// The contract is fail-closed: whenever a check cannot complete (lock
/// timeout, upstream failure, malformed state) the reporting component maps
/// the condition onto one of these kinds instead of defaulting to valid.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    /// A field or payload failed structural validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Fewer distinct valid signers than the required threshold.
    #[error("Quorum not met: {matched}/{required} distinct signers")]
    QuorumNotMet {
        /// Distinct valid signers actually found.
        matched: usize,
        /// Required threshold.
        required: usize,
    },

    /// Nonce was already consumed (replay attempt).
    #[error("Nonce {0} already used (replay detected)")]
    Replay(u64),

    /// One or more input references were already spent.
    #[error("Input already spent (double-spend detected)")]
    DoubleSpend,

    /// A state transition outside the allowed-transitions table.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        /// Source state code.
        from: u8,
        /// Destination state code.
        to: u8,
    },

    /// A configured resource ceiling was exceeded.
    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),

    /// A guard's critical section could not be acquired in bounded time.
    /// Callers must treat this identically to a validation failure.
    #[error("Lock acquisition timed out")]
    LockTimeout,

    /// An upstream provider (height, block, accounts) failed after all
    /// retries were exhausted.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Recomputed content hash does not match the recorded one.
    #[error("Content hash mismatch")]
    HashMismatch,
}

/// Outcome of a single validation check.
pub type ValidationResult = Result<(), ValidationError>;
