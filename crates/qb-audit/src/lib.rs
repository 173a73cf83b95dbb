//! # Quantum-Bridge Audit
//!
//! Block-level fraud detection: fetches blocks, runs every transaction
//! through the guard battery and the threshold verifier in a fixed rule
//! order, and reports per-block verdicts. Also hosts the validator stake
//! check.

#![warn(missing_docs)]

pub mod auditor;
pub mod ports;
pub mod stake;

pub use auditor::{AuditConfig, FraudAuditor, FraudDetectionResult};
pub use ports::{AccountProvider, BlockProvider, MockAccountProvider, MockBlockProvider};
pub use stake::{StakeCheck, StakeConfig, ValidatorStakeChecker};
