//! Core signature domain: algorithm set, suites, and the capability table.

pub mod ecdsa;
pub mod entities;
pub mod errors;
pub mod hybrid;
pub mod mldsa;
pub mod registry;
pub mod slhdsa;

pub use entities::{
    AlgorithmId, BridgeSignature, EcdsaSignature, HybridSignature, PqSignature,
};
pub use errors::SignatureError;
pub use registry::{AlgorithmRegistry, SignatureSuite, SignerBinding, SuiteKeypair};
