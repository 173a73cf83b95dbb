//! # Quantum-Bridge Signatures
//!
//! Signature verification for the bridge trust core during the
//! post-quantum migration window: classical ECDSA, two post-quantum
//! families (ML-DSA-65, SLH-DSA-SHA2-128s), and the two hybrid
//! compositions, behind one closed algorithm set.
//!
//! ## Architecture
//!
//! - `domain` holds the algorithm set, the per-family suites, and the
//!   capability table they register into.
//! - `relayers` is the explicit membership registry; nothing about a
//!   signer is ever inferred from the signature alone.
//! - `threshold` counts distinct registered relayers toward a quorum.

#![warn(missing_docs)]

pub mod domain;
pub mod relayers;
pub mod threshold;

pub use domain::{
    AlgorithmId, AlgorithmRegistry, BridgeSignature, EcdsaSignature, HybridSignature, PqSignature,
    SignatureError, SignatureSuite, SignerBinding, SuiteKeypair,
};
pub use relayers::{RegisteredKey, RelayerRegistry, SignerIdentity};
pub use threshold::{QuorumResult, ThresholdVerifier};
