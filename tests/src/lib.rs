//! # Quantum-Bridge Test Suite
//!
//! Unified test crate containing:
//!
//! ```text
//! tests/src/
//! ├── integration/      # Cross-crate choreography
//! │   ├── quorum.rs         # Threshold and hybrid properties
//! │   ├── concurrency.rs    # Guard races and lock discipline
//! │   └── transfer_flow.rs  # Proof -> batch -> audit end to end
//! │
//! └── persistence/      # Round-trips for every persisted logical state
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qb-tests
//! cargo test -p qb-tests integration::
//! cargo test -p qb-tests persistence::
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
pub mod persistence;
