//! # State-Transition Guard
//!
//! Closed transfer lifecycle with an explicit allowed-transition table.
//! Instruction payloads may carry a tagged `[tag][from][to]` triple; tagged
//! payloads are validated against the table, untagged payloads are exempt.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{ValidationError, ValidationResult};
use std::collections::HashSet;

/// Leading byte marking a state-transition instruction payload.
pub const STATE_TRANSITION_TAG: u8 = 0x54;

/// Transfer lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransferState {
    /// Accepted, not yet picked up.
    Pending = 0,
    /// Being relayed.
    Processing = 1,
    /// Settled on the target chain.
    Completed = 2,
    /// Relaying failed; eligible for retry.
    Failed = 3,
}

impl TransferState {
    /// Wire code of this state.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TransferState {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TransferState::Pending),
            1 => Ok(TransferState::Processing),
            2 => Ok(TransferState::Completed),
            3 => Ok(TransferState::Failed),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown transfer state code {other}"
            ))),
        }
    }
}

/// Reloadable source-to-destination transition table.
pub struct StateTransitionGuard {
    allowed: RwLock<HashSet<(u8, u8)>>,
}

impl StateTransitionGuard {
    /// Guard with the default lifecycle rules.
    ///
    /// Failed transfers may return to pending; that is the one sanctioned
    /// retry path. Completed is terminal.
    pub fn new() -> Self {
        use TransferState::*;
        Self::with_rules(&[
            (Pending, Processing),
            (Pending, Completed),
            (Pending, Failed),
            (Processing, Completed),
            (Processing, Failed),
            (Failed, Pending),
        ])
    }

    /// Guard with an explicit rule set.
    pub fn with_rules(rules: &[(TransferState, TransferState)]) -> Self {
        let allowed = rules
            .iter()
            .map(|(from, to)| (from.code(), to.code()))
            .collect();
        Self {
            allowed: RwLock::new(allowed),
        }
    }

    /// Guard over raw state codes, for lifecycles other than the transfer
    /// one (the proof archive reuses this for its status set).
    pub fn with_code_rules(rules: &[(u8, u8)]) -> Self {
        Self {
            allowed: RwLock::new(rules.iter().copied().collect()),
        }
    }

    /// Replace the rule set at runtime.
    pub fn reload(&self, rules: &[(TransferState, TransferState)]) {
        let mut allowed = self.allowed.write();
        allowed.clear();
        allowed.extend(rules.iter().map(|(from, to)| (from.code(), to.code())));
    }

    /// Validate a typed transition.
    pub fn validate(&self, from: TransferState, to: TransferState) -> ValidationResult {
        self.validate_codes(from.code(), to.code())
    }

    /// Validate a transition by raw codes. Codes outside the closed state
    /// set are never in the table, so they reject like any other
    /// disallowed pair.
    pub fn validate_codes(&self, from: u8, to: u8) -> ValidationResult {
        if self.allowed.read().contains(&(from, to)) {
            Ok(())
        } else {
            Err(ValidationError::InvalidStateTransition { from, to })
        }
    }

    /// Validate an instruction payload.
    ///
    /// Payloads not starting with [`STATE_TRANSITION_TAG`] are exempt. A
    /// tagged payload too short to carry both state codes is malformed
    /// input, not a transition failure.
    pub fn validate_payload(&self, payload: &[u8]) -> ValidationResult {
        if payload.first() != Some(&STATE_TRANSITION_TAG) {
            return Ok(());
        }
        if payload.len() < 3 {
            return Err(ValidationError::InvalidInput(
                "truncated state-transition payload".into(),
            ));
        }
        self.validate_codes(payload[1], payload[2])
    }
}

impl Default for StateTransitionGuard {
    fn default() -> Self {
        Self::new()
    }
}
