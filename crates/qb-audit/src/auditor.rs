//! # Block Fraud Auditor
//!
//! Runs every transaction in a fetched block through the guard battery in
//! a fixed order, short-circuiting on the first violation and reporting
//! the failing index and rule.
//!
//! Block evaluation is not transactional across transactions: guard state
//! written by earlier, passing transactions stays written when a later
//! transaction fails.

use crate::ports::BlockProvider;
use qb_guards::backoff::RetryPolicy;
use qb_guards::double_spend::DoubleSpendGuard;
use qb_guards::state_transition::StateTransitionGuard;
use qb_signatures::{BridgeSignature, ThresholdVerifier};
use serde::{Deserialize, Serialize};
use shared_types::{BlockHeight, BridgeTransaction, ValidationError, ValidationResult};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Auditor tuning.
#[derive(Clone, Copy, Debug)]
pub struct AuditConfig {
    /// A block carrying more transactions than this is rejected outright.
    pub max_transactions_per_block: usize,
    /// Per-transaction encoded size ceiling in bytes.
    pub max_transaction_size: usize,
    /// Distinct relayer signatures required per transaction.
    pub quorum_threshold: usize,
    /// Declared gas-estimate ceiling.
    pub max_gas_estimate: u64,
    /// Transfer amount ceiling in base units.
    pub max_amount: u64,
    /// Retry schedule for block fetches.
    pub retry: RetryPolicy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_transactions_per_block: 1000,
            max_transaction_size: 10_240,
            quorum_threshold: 2,
            max_gas_estimate: 1_000_000,
            max_amount: 1_000_000_000_000_000_000,
            retry: RetryPolicy::default(),
        }
    }
}

/// Verdict for one audited block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudDetectionResult {
    /// Correlation id for this audit run.
    pub audit_id: Uuid,
    /// Height that was audited.
    pub block_height: BlockHeight,
    /// Whether any rule was violated.
    pub fraud_detected: bool,
    /// Index of the first failing transaction, when one failed.
    pub failing_index: Option<usize>,
    /// The violated rule, when one failed. A block-level rejection (too
    /// many transactions) carries no index.
    pub violation: Option<ValidationError>,
    /// Human-readable reason.
    pub reason: Option<String>,
    /// Transactions that passed before the audit stopped.
    pub transactions_checked: usize,
}

impl FraudDetectionResult {
    fn clean(audit_id: Uuid, height: BlockHeight, checked: usize) -> Self {
        Self {
            audit_id,
            block_height: height,
            fraud_detected: false,
            failing_index: None,
            violation: None,
            reason: None,
            transactions_checked: checked,
        }
    }

    fn violation(
        audit_id: Uuid,
        height: BlockHeight,
        index: Option<usize>,
        violation: ValidationError,
        checked: usize,
    ) -> Self {
        let reason = match index {
            Some(i) => format!("transaction {i}: {violation}"),
            None => format!("block: {violation}"),
        };
        Self {
            audit_id,
            block_height: height,
            fraud_detected: true,
            failing_index: index,
            violation: Some(violation),
            reason: Some(reason),
            transactions_checked: checked,
        }
    }
}

/// Top-level orchestrator over the guards and the threshold verifier.
pub struct FraudAuditor {
    blocks: Arc<dyn BlockProvider>,
    verifier: Arc<ThresholdVerifier>,
    double_spend: Arc<DoubleSpendGuard>,
    transitions: Arc<StateTransitionGuard>,
    config: AuditConfig,
}

impl FraudAuditor {
    /// Auditor over the given collaborators.
    pub fn new(
        blocks: Arc<dyn BlockProvider>,
        verifier: Arc<ThresholdVerifier>,
        double_spend: Arc<DoubleSpendGuard>,
        transitions: Arc<StateTransitionGuard>,
        config: AuditConfig,
    ) -> Self {
        Self {
            blocks,
            verifier,
            double_spend,
            transitions,
            config,
        }
    }

    /// Audit the block at `height`.
    ///
    /// A block that cannot be fetched after retries is an operational
    /// failure (`Err`); a fetched block that violates a rule is a verdict
    /// (`Ok` with `fraud_detected`).
    pub async fn detect_fraud_in_block(
        &self,
        height: BlockHeight,
    ) -> Result<FraudDetectionResult, ValidationError> {
        let audit_id = Uuid::new_v4();
        let block = self
            .config
            .retry
            .run(|| self.blocks.block_at(height))
            .await?;

        if block.transactions.len() > self.config.max_transactions_per_block {
            warn!(
                "[qb-audit] {} block {} rejected: {} transactions",
                audit_id,
                height,
                block.transactions.len()
            );
            return Ok(FraudDetectionResult::violation(
                audit_id,
                height,
                None,
                ValidationError::ResourceLimitExceeded(format!(
                    "{} transactions exceeds block limit {}",
                    block.transactions.len(),
                    self.config.max_transactions_per_block
                )),
                0,
            ));
        }

        for (index, tx) in block.transactions.iter().enumerate() {
            if let Err(violation) = self.check_transaction(tx).await {
                warn!(
                    "[qb-audit] {} block {} tx {} failed: {}",
                    audit_id, height, index, violation
                );
                return Ok(FraudDetectionResult::violation(
                    audit_id,
                    height,
                    Some(index),
                    violation,
                    index,
                ));
            }
        }

        info!(
            "[qb-audit] {} block {} clean ({} transactions)",
            audit_id,
            height,
            block.transactions.len()
        );
        Ok(FraudDetectionResult::clean(
            audit_id,
            height,
            block.transactions.len(),
        ))
    }

    /// The fixed rule order: size, signatures, structure, double-spend,
    /// state transitions, resource ceilings.
    async fn check_transaction(&self, tx: &BridgeTransaction) -> ValidationResult {
        if tx.encoded_len() > self.config.max_transaction_size {
            return Err(ValidationError::ResourceLimitExceeded(format!(
                "transaction of {} bytes exceeds {}",
                tx.encoded_len(),
                self.config.max_transaction_size
            )));
        }

        if tx.signatures.is_empty() {
            return Err(ValidationError::InvalidInput(
                "transaction carries no signatures".into(),
            ));
        }
        let mut signatures = Vec::with_capacity(tx.signatures.len());
        for wire in &tx.signatures {
            let sig = BridgeSignature::from_wire(wire)
                .map_err(|e| ValidationError::InvalidInput(e.to_string()))?;
            signatures.push(sig);
        }
        self.verifier
            .verify_quorum(&tx.message_hash, &signatures, self.config.quorum_threshold)?;

        if tx.instructions.is_empty() {
            return Err(ValidationError::InvalidInput(
                "transaction carries no instructions".into(),
            ));
        }

        self.double_spend.check_and_mark(&tx.inputs).await?;

        for instruction in &tx.instructions {
            self.transitions.validate_payload(instruction)?;
        }

        if tx.gas_estimate > self.config.max_gas_estimate {
            return Err(ValidationError::ResourceLimitExceeded(format!(
                "gas estimate {} exceeds {}",
                tx.gas_estimate, self.config.max_gas_estimate
            )));
        }
        if tx.amount > self.config.max_amount {
            return Err(ValidationError::ResourceLimitExceeded(format!(
                "amount {} exceeds {}",
                tx.amount, self.config.max_amount
            )));
        }
        Ok(())
    }
}
