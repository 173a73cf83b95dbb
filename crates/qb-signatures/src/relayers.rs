//! # Relayer Registry
//!
//! Explicit registry of authorized relayers and their per-algorithm keys.
//! Membership is declared up front; nothing is inferred from key material
//! found on a signature. A relayer that is not in the registry contributes
//! zero matches to any quorum.

use crate::domain::entities::AlgorithmId;
use crate::domain::errors::SignatureError;
use crate::domain::registry::check_key_len;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::Address;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// A public key registered for one algorithm.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredKey {
    /// Key bytes in the algorithm's registered encoding.
    pub bytes: Vec<u8>,
    /// Revoked keys stay in the table for audit but never match.
    pub active: bool,
    /// Unix timestamp of registration.
    pub registered_at: u64,
}

/// One relayer's identity: its address plus registered keys.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerIdentity {
    /// Relayer address.
    #[serde_as(as = "Bytes")]
    pub address: Address,
    /// Keys by algorithm. ECDSA relayers need no entry; their identity is
    /// bound through address recovery.
    pub keys: HashMap<AlgorithmId, RegisteredKey>,
}

impl SignerIdentity {
    fn new(address: Address) -> Self {
        Self {
            address,
            keys: HashMap::new(),
        }
    }
}

/// Thread-safe relayer membership and key table.
pub struct RelayerRegistry {
    relayers: RwLock<HashMap<Address, SignerIdentity>>,
}

impl RelayerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            relayers: RwLock::new(HashMap::new()),
        }
    }

    /// Add a relayer. Re-registering an existing relayer keeps its keys.
    pub fn register_relayer(&self, address: Address) {
        self.relayers
            .write()
            .entry(address)
            .or_insert_with(|| SignerIdentity::new(address));
    }

    /// Register a public key for a relayer and algorithm.
    ///
    /// The key length must match the algorithm's fixed size, the relayer
    /// must already be registered, and the algorithm slot must be free of
    /// an active key.
    pub fn register_key(
        &self,
        address: &Address,
        algorithm: AlgorithmId,
        key_bytes: Vec<u8>,
    ) -> Result<(), SignatureError> {
        check_key_len(algorithm, &key_bytes)?;
        let mut relayers = self.relayers.write();
        let identity = relayers
            .get_mut(address)
            .ok_or(SignatureError::UnknownRelayer)?;
        if identity.keys.get(&algorithm).is_some_and(|k| k.active) {
            return Err(SignatureError::KeyAlreadyRegistered(algorithm));
        }
        identity.keys.insert(
            algorithm,
            RegisteredKey {
                bytes: key_bytes,
                active: true,
                registered_at: unix_now(),
            },
        );
        Ok(())
    }

    /// Revoke a relayer's key for one algorithm. The entry is kept but
    /// stops matching immediately.
    pub fn revoke_key(
        &self,
        address: &Address,
        algorithm: AlgorithmId,
    ) -> Result<(), SignatureError> {
        let mut relayers = self.relayers.write();
        let identity = relayers
            .get_mut(address)
            .ok_or(SignatureError::UnknownRelayer)?;
        match identity.keys.get_mut(&algorithm) {
            Some(key) => {
                key.active = false;
                Ok(())
            }
            None => Err(SignatureError::UnknownRelayer),
        }
    }

    /// Remove a relayer and every key it holds. Its signatures stop
    /// counting toward quorums immediately.
    pub fn remove_relayer(&self, address: &Address) -> Result<(), SignatureError> {
        self.relayers
            .write()
            .remove(address)
            .map(|_| ())
            .ok_or(SignatureError::UnknownRelayer)
    }

    /// Whether an address belongs to a registered relayer.
    pub fn is_registered(&self, address: &Address) -> bool {
        self.relayers.read().contains_key(address)
    }

    /// Whether a classical signature from `address` may count.
    ///
    /// The relayer must be registered, and when it has an ECDSA key on
    /// file that key must still be active. Relayers without an ECDSA entry
    /// bind through address recovery alone, so membership suffices.
    pub fn accepts_classical(&self, address: &Address) -> bool {
        match self.relayers.read().get(address) {
            None => false,
            Some(identity) => identity
                .keys
                .get(&AlgorithmId::Ecdsa)
                .map_or(true, |key| key.active),
        }
    }

    /// Active key bytes for a relayer and algorithm.
    pub fn active_key(&self, address: &Address, algorithm: AlgorithmId) -> Option<Vec<u8>> {
        self.relayers
            .read()
            .get(address)?
            .keys
            .get(&algorithm)
            .filter(|k| k.active)
            .map(|k| k.bytes.clone())
    }

    /// All relayers holding an active key for an algorithm.
    pub fn candidates(&self, algorithm: AlgorithmId) -> Vec<(Address, Vec<u8>)> {
        self.relayers
            .read()
            .values()
            .filter_map(|identity| {
                identity
                    .keys
                    .get(&algorithm)
                    .filter(|k| k.active)
                    .map(|k| (identity.address, k.bytes.clone()))
            })
            .collect()
    }

    /// Number of registered relayers.
    pub fn len(&self) -> usize {
        self.relayers.read().len()
    }

    /// Whether no relayer is registered.
    pub fn is_empty(&self) -> bool {
        self.relayers.read().is_empty()
    }

    /// Serializable copy of the full table, for persistence.
    pub fn snapshot(&self) -> Vec<SignerIdentity> {
        self.relayers.read().values().cloned().collect()
    }

    /// Replace the table with a previously captured snapshot.
    pub fn restore(&self, identities: Vec<SignerIdentity>) {
        let mut relayers = self.relayers.write();
        relayers.clear();
        for identity in identities {
            relayers.insert(identity.address, identity);
        }
    }
}

impl Default for RelayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
