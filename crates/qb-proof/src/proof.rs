//! # Canonical Transfer Proofs
//!
//! A proof captures one claimed cross-chain transfer. Its content hash is
//! computed over a fixed field order with length-prefixed packing, so any
//! field mutation is detectable. Relayer attestations attach to the hash;
//! batching anchors many proofs under one Merkle root.

use crate::merkle;
use qb_signatures::domain::ecdsa::{keccak256, verify_and_recover};
use qb_signatures::{AlgorithmRegistry, BridgeSignature, SignerBinding, ThresholdVerifier};
use qb_guards::state_transition::StateTransitionGuard;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{Hash, ValidationError, ValidationResult};
use tracing::debug;

/// Hard ceiling on a single transfer amount, in base units.
pub const MAX_TRANSFER_AMOUNT: u64 = 1_000_000_000_000_000_000;

/// Maximum token symbol length.
const MAX_TOKEN_LEN: usize = 16;

// =============================================================================
// Chain Tags and Status
// =============================================================================

/// The two chain families the bridge connects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChainTag {
    /// EVM family.
    Ethereum = 1,
    /// Solana family.
    Solana = 2,
}

impl ChainTag {
    /// Wire code for this chain.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ChainTag {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ChainTag::Ethereum),
            2 => Ok(ChainTag::Solana),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown chain tag {other}"
            ))),
        }
    }
}

/// Closed proof lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProofStatus {
    /// Created, awaiting attestations.
    Pending = 0,
    /// Quorum reached.
    Confirmed = 1,
    /// Rejected by a guard or audit.
    Rejected = 2,
    /// Anchored on chain.
    Finalized = 3,
}

impl ProofStatus {
    /// Wire code for this status.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ProofStatus {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ProofStatus::Pending),
            1 => Ok(ProofStatus::Confirmed),
            2 => Ok(ProofStatus::Rejected),
            3 => Ok(ProofStatus::Finalized),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown proof status code {other}"
            ))),
        }
    }
}

/// Transition rules for the proof lifecycle, expressed through the shared
/// transition guard rather than a second rule engine.
pub fn status_rules() -> StateTransitionGuard {
    StateTransitionGuard::with_code_rules(&[
        (ProofStatus::Pending.code(), ProofStatus::Confirmed.code()),
        (ProofStatus::Pending.code(), ProofStatus::Rejected.code()),
        (ProofStatus::Confirmed.code(), ProofStatus::Finalized.code()),
        (ProofStatus::Confirmed.code(), ProofStatus::Rejected.code()),
    ])
}

// =============================================================================
// Proof
// =============================================================================

/// Request to create a proof; every field is validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Chain the deposit happened on.
    pub source_chain: ChainTag,
    /// Chain the funds are released on.
    pub target_chain: ChainTag,
    /// Sender address in the source chain's format.
    pub sender: String,
    /// Recipient address in the target chain's format.
    pub recipient: String,
    /// Token symbol.
    pub token: String,
    /// Amount in base units.
    pub amount: u64,
    /// Transfer nonce.
    pub nonce: u64,
    /// Unix timestamp of the source event.
    pub timestamp: u64,
    /// Source transaction reference, 0x-prefixed 64-hex.
    pub source_tx_ref: String,
}

/// One attestation attached to a proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedSignature {
    /// Signer identity: recovered address bytes for classical, declared
    /// public key bytes for post-quantum and hybrid.
    pub signer: Vec<u8>,
    /// The signature itself.
    pub signature: BridgeSignature,
}

/// A validated transfer proof.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProof {
    /// The validated transfer fields.
    pub request: TransferRequest,
    /// Content hash over the canonical field packing.
    #[serde_as(as = "Bytes")]
    pub hash: Hash,
    /// Attached attestations, one per distinct signer.
    pub signatures: Vec<AttachedSignature>,
    /// Root of the batch this proof is anchored under, if any.
    #[serde_as(as = "Option<Bytes>")]
    pub merkle_root: Option<Hash>,
    /// Inclusion path toward `merkle_root`.
    #[serde_as(as = "Option<Vec<Bytes>>")]
    pub merkle_path: Option<Vec<Hash>>,
    /// Lifecycle status.
    pub status: ProofStatus,
}

impl TransferProof {
    /// Validate a request and mint a pending proof carrying its content
    /// hash.
    pub fn create(request: TransferRequest) -> Result<Self, ValidationError> {
        validate_request(&request)?;
        let hash = content_hash(&request);
        debug!("[qb-proof] created proof {}", hex_prefix(&hash));
        Ok(Self {
            request,
            hash,
            signatures: Vec::new(),
            merkle_root: None,
            merkle_path: None,
            status: ProofStatus::Pending,
        })
    }

    /// Attach an attestation over this proof's hash.
    ///
    /// Post-quantum and hybrid signatures must declare the signer's public
    /// key; the signature is verified before it is attached, and a second
    /// attestation from the same signer identity is rejected.
    pub fn add_signature(
        &mut self,
        algorithms: &AlgorithmRegistry,
        signature: BridgeSignature,
        public_key: Option<&[u8]>,
    ) -> ValidationResult {
        let signer: Vec<u8> = match &signature {
            BridgeSignature::Ecdsa(sig) => verify_and_recover(&self.hash, sig)
                .map_err(|e| ValidationError::InvalidInput(e.to_string()))?
                .to_vec(),
            BridgeSignature::MlDsa(_) | BridgeSignature::SlhDsa(_) => {
                let key = public_key.ok_or_else(|| {
                    ValidationError::InvalidInput("post-quantum signature needs a public key".into())
                })?;
                // Identity binds through the key; the binding address is
                // not consulted for these families.
                let binding = SignerBinding {
                    address: &[0u8; 20],
                    public_key: key,
                };
                algorithms
                    .verify(&self.hash, &signature, &binding)
                    .map_err(|e| ValidationError::InvalidInput(e.to_string()))?;
                key.to_vec()
            }
            BridgeSignature::HybridMlDsa(sig) | BridgeSignature::HybridSlhDsa(sig) => {
                let key = public_key.ok_or_else(|| {
                    ValidationError::InvalidInput("hybrid signature needs a public key".into())
                })?;
                let address = verify_and_recover(&self.hash, &sig.classical)
                    .map_err(|e| ValidationError::InvalidInput(e.to_string()))?;
                let binding = SignerBinding {
                    address: &address,
                    public_key: key,
                };
                algorithms
                    .verify(&self.hash, &signature, &binding)
                    .map_err(|e| ValidationError::InvalidInput(e.to_string()))?;
                key.to_vec()
            }
        };

        if self.signatures.iter().any(|s| s.signer == signer) {
            return Err(ValidationError::InvalidInput(
                "duplicate signer on proof".into(),
            ));
        }
        self.signatures.push(AttachedSignature { signer, signature });
        Ok(())
    }

    /// Run a quorum check over the attached attestations.
    pub fn verify_quorum(
        &self,
        verifier: &ThresholdVerifier,
        threshold: usize,
    ) -> Result<qb_signatures::QuorumResult, ValidationError> {
        let sigs: Vec<BridgeSignature> = self
            .signatures
            .iter()
            .map(|s| s.signature.clone())
            .collect();
        verifier.verify_quorum(&self.hash, &sigs, threshold)
    }

    /// Anchor this proof under a batch root.
    pub fn attach_merkle(&mut self, root: Hash, path: Vec<Hash>) {
        self.merkle_root = Some(root);
        self.merkle_path = Some(path);
    }

    /// Check integrity: the content hash must match a recomputation, and
    /// an attached Merkle anchor must prove inclusion of the hash.
    pub fn verify(&self) -> ValidationResult {
        if content_hash(&self.request) != self.hash {
            return Err(ValidationError::HashMismatch);
        }
        match (&self.merkle_root, &self.merkle_path) {
            (None, None) => Ok(()),
            (Some(root), Some(path)) => {
                if merkle::verify_inclusion(&self.hash, path, root) {
                    Ok(())
                } else {
                    Err(ValidationError::HashMismatch)
                }
            }
            // A root without a path (or vice versa) proves nothing.
            _ => Err(ValidationError::InvalidInput(
                "merkle anchor requires both root and path".into(),
            )),
        }
    }

    /// Move the proof through its lifecycle under the given rules.
    pub fn update_status(
        &mut self,
        to: ProofStatus,
        rules: &StateTransitionGuard,
    ) -> ValidationResult {
        rules.validate_codes(self.status.code(), to.code())?;
        self.status = to;
        Ok(())
    }
}

// =============================================================================
// Validation and Hashing
// =============================================================================

fn validate_request(request: &TransferRequest) -> ValidationResult {
    if request.source_chain == request.target_chain {
        return Err(ValidationError::InvalidInput(
            "source and target chain must differ".into(),
        ));
    }
    validate_address(request.source_chain, &request.sender, "sender")?;
    validate_address(request.target_chain, &request.recipient, "recipient")?;

    if request.token.is_empty()
        || request.token.len() > MAX_TOKEN_LEN
        || !request.token.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ValidationError::InvalidInput("invalid token symbol".into()));
    }
    if request.amount == 0 || request.amount > MAX_TRANSFER_AMOUNT {
        return Err(ValidationError::InvalidInput(format!(
            "amount {} outside (0, {}]",
            request.amount, MAX_TRANSFER_AMOUNT
        )));
    }
    if request.timestamp == 0 {
        return Err(ValidationError::InvalidInput("zero timestamp".into()));
    }
    if !is_prefixed_hex(&request.source_tx_ref, 64) {
        return Err(ValidationError::InvalidInput(
            "transaction reference must be 0x-prefixed 64-hex".into(),
        ));
    }
    Ok(())
}

fn validate_address(chain: ChainTag, address: &str, field: &str) -> ValidationResult {
    let ok = match chain {
        ChainTag::Ethereum => is_prefixed_hex(address, 40),
        ChainTag::Solana => address.len() == 64 && address.chars().all(|c| c.is_ascii_hexdigit()),
    };
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidInput(format!(
            "invalid {field} address for {chain:?}"
        )))
    }
}

fn is_prefixed_hex(value: &str, hex_len: usize) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|rest| rest.len() == hex_len && rest.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Canonical content hash: keccak256 over each field in fixed order, each
/// packed as `[u32 BE length][bytes]`.
pub fn content_hash(request: &TransferRequest) -> Hash {
    let mut packed = Vec::with_capacity(256);
    pack(&mut packed, &[request.source_chain.code()]);
    pack(&mut packed, &[request.target_chain.code()]);
    pack(&mut packed, request.sender.as_bytes());
    pack(&mut packed, request.recipient.as_bytes());
    pack(&mut packed, request.token.as_bytes());
    pack(&mut packed, &request.amount.to_be_bytes());
    pack(&mut packed, &request.nonce.to_be_bytes());
    pack(&mut packed, &request.timestamp.to_be_bytes());
    pack(&mut packed, request.source_tx_ref.as_bytes());
    keccak256(&packed)
}

fn pack(out: &mut Vec<u8>, field: &[u8]) {
    out.extend_from_slice(&(field.len() as u32).to_be_bytes());
    out.extend_from_slice(field);
}

fn hex_prefix(hash: &Hash) -> String {
    hash[..4].iter().map(|b| format!("{b:02x}")).collect()
}

// =============================================================================
// Test Helpers
// =============================================================================

/// Well-formed fixtures shared by this crate's tests and the integration
/// suite.
pub mod test_helpers {
    use super::*;

    /// A valid Ethereum-to-Solana transfer request.
    pub fn sample_request() -> TransferRequest {
        TransferRequest {
            source_chain: ChainTag::Ethereum,
            target_chain: ChainTag::Solana,
            sender: format!("0x{}", "ab".repeat(20)),
            recipient: "cd".repeat(32),
            token: "QBT".into(),
            amount: 1_000_000,
            nonce: 42,
            timestamp: 1_700_000_000,
            source_tx_ref: format!("0x{}", "12".repeat(32)),
        }
    }
}
