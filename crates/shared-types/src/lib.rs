//! # Shared Types Crate
//!
//! Cross-crate entities and error kinds for Quantum-Bridge.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Types consumed by more than one crate are
//!   defined here, never duplicated downstream.
//! - **Fail-Closed Kinds**: `ValidationError` is the one cross-cutting error
//!   vocabulary; every guard and the auditor report through it so that an
//!   incomplete check can never surface as a pass.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
