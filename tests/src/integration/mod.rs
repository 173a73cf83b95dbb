//! Cross-crate integration tests.

pub mod concurrency;
pub mod quorum;
pub mod transfer_flow;
