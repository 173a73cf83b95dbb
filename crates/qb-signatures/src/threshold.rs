//! # Threshold Verification
//!
//! Quorum counting over a batch of submitted signatures. Each registered
//! relayer contributes at most one match regardless of how many signatures
//! it submits, invalid signatures contribute nothing, and counting stops
//! as soon as the threshold is reached.

use crate::domain::entities::{AlgorithmId, BridgeSignature};
use crate::domain::registry::{AlgorithmRegistry, SignerBinding};
use crate::relayers::RelayerRegistry;
use shared_types::{Address, Hash, ValidationError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a quorum check that met its threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuorumResult {
    /// Relayers attributed a valid signature, in match order.
    pub matched: Vec<Address>,
    /// Threshold that was required.
    pub required: usize,
}

/// Verifies relayer quorums against the algorithm and relayer registries.
pub struct ThresholdVerifier {
    algorithms: AlgorithmRegistry,
    relayers: Arc<RelayerRegistry>,
}

impl ThresholdVerifier {
    /// Build a verifier over a relayer registry, with all algorithm suites
    /// enabled.
    pub fn new(relayers: Arc<RelayerRegistry>) -> Self {
        Self {
            algorithms: AlgorithmRegistry::with_defaults(),
            relayers,
        }
    }

    /// Check that at least `threshold` distinct registered relayers signed
    /// `message_hash`.
    ///
    /// Fails fast when fewer signatures than the threshold were submitted;
    /// no cryptographic work happens in that case.
    pub fn verify_quorum(
        &self,
        message_hash: &Hash,
        signatures: &[BridgeSignature],
        threshold: usize,
    ) -> Result<QuorumResult, ValidationError> {
        if threshold == 0 {
            return Err(ValidationError::InvalidInput(
                "quorum threshold must be positive".into(),
            ));
        }
        if signatures.len() < threshold {
            debug!(
                "[qb-sig] quorum short-circuit: {} signatures < threshold {}",
                signatures.len(),
                threshold
            );
            return Err(ValidationError::QuorumNotMet {
                matched: 0,
                required: threshold,
            });
        }

        let mut matched_set: HashSet<Address> = HashSet::new();
        let mut matched: Vec<Address> = Vec::new();

        for signature in signatures {
            if let Some(address) = self.attribute(message_hash, signature, &matched_set) {
                matched_set.insert(address);
                matched.push(address);
                if matched.len() >= threshold {
                    debug!(
                        "[qb-sig] quorum met: {}/{} after {} signatures",
                        matched.len(),
                        threshold,
                        matched.len()
                    );
                    return Ok(QuorumResult {
                        matched,
                        required: threshold,
                    });
                }
            }
        }

        warn!(
            "[qb-sig] quorum not met: {}/{}",
            matched.len(),
            threshold
        );
        Err(ValidationError::QuorumNotMet {
            matched: matched.len(),
            required: threshold,
        })
    }

    /// Attribute one signature to a registered relayer not yet counted.
    ///
    /// Returns `None` for invalid signatures, unregistered signers, and
    /// relayers that already contributed; a bad signature never aborts the
    /// batch, it just fails to count.
    fn attribute(
        &self,
        message_hash: &Hash,
        signature: &BridgeSignature,
        already_matched: &HashSet<Address>,
    ) -> Option<Address> {
        match signature {
            BridgeSignature::Ecdsa(sig) => {
                let address =
                    crate::domain::ecdsa::verify_and_recover(message_hash, sig).ok()?;
                // Revocation of a registered classical key must fail closed,
                // same as the post-quantum slots.
                if already_matched.contains(&address)
                    || !self.relayers.accepts_classical(&address)
                {
                    return None;
                }
                Some(address)
            }
            BridgeSignature::MlDsa(_) | BridgeSignature::SlhDsa(_) => {
                // No recovery for lattice or hash-based signatures; try each
                // registered key for the algorithm until one verifies.
                let algorithm = signature.algorithm();
                self.match_against_candidates(message_hash, signature, algorithm, already_matched)
            }
            BridgeSignature::HybridMlDsa(sig) | BridgeSignature::HybridSlhDsa(sig) => {
                // The classical half names the candidate; both halves must
                // verify for that single relayer.
                let algorithm = signature.algorithm();
                let address =
                    crate::domain::ecdsa::verify_and_recover(message_hash, &sig.classical).ok()?;
                if already_matched.contains(&address) {
                    return None;
                }
                let key = self.relayers.active_key(&address, algorithm)?;
                let binding = SignerBinding {
                    address: &address,
                    public_key: &key,
                };
                self.algorithms
                    .verify(message_hash, signature, &binding)
                    .ok()?;
                Some(address)
            }
        }
    }

    fn match_against_candidates(
        &self,
        message_hash: &Hash,
        signature: &BridgeSignature,
        algorithm: AlgorithmId,
        already_matched: &HashSet<Address>,
    ) -> Option<Address> {
        for (address, key) in self.relayers.candidates(algorithm) {
            if already_matched.contains(&address) {
                continue;
            }
            let binding = SignerBinding {
                address: &address,
                public_key: &key,
            };
            if self
                .algorithms
                .verify(message_hash, signature, &binding)
                .is_ok()
            {
                return Some(address);
            }
        }
        None
    }

    /// The relayer registry this verifier consults.
    pub fn relayers(&self) -> &RelayerRegistry {
        &self.relayers
    }

    /// The algorithm capability table.
    pub fn algorithms(&self) -> &AlgorithmRegistry {
        &self.algorithms
    }
}
