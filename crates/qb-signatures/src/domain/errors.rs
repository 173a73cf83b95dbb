//! # Signature Errors
//!
//! Error types for signature generation, registration, and verification.

use super::entities::AlgorithmId;
use thiserror::Error;

/// Errors that can occur in the signature subsystem.
///
/// Unlike the guard crates, this crate is allowed to surface caller defects
/// (an unknown algorithm id on the wire is a bug in the submitting client,
/// not a runtime security condition).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature payload is malformed (wrong length, invalid encoding).
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Signature does not verify against the message and key.
    #[error("Signature verification failed")]
    VerificationFailed,

    /// ECDSA signature with a high S value (EIP-2 malleability protection).
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid ECDSA recovery id (v must be 0, 1, 27, or 28).
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Public key recovery from an ECDSA signature failed.
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// Wire byte does not name a known algorithm. Caller defect.
    #[error("Unknown algorithm id: {0:#04x}")]
    UnknownAlgorithm(u8),

    /// Registered public key length does not match the algorithm's fixed
    /// expectation.
    #[error("Public key length mismatch for {algorithm:?}: expected {expected}, got {actual}")]
    KeyLengthMismatch {
        /// Algorithm the key was registered under.
        algorithm: AlgorithmId,
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },

    /// Hybrid payload whose classical length prefix overruns the buffer.
    /// Verification fails closed on this condition.
    #[error("Truncated hybrid signature payload")]
    TruncatedHybrid,

    /// Key generation or signing failed inside a crypto backend.
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Relayer is not present in the registry.
    #[error("Unknown relayer")]
    UnknownRelayer,

    /// Relayer already holds a key for this algorithm.
    #[error("Key already registered for {0:?}")]
    KeyAlreadyRegistered(AlgorithmId),
}
