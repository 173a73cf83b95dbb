//! # Persistence Round-Trips
//!
//! Every piece of persisted logical state (nonce registry, spent-output
//! set, rate-limit table, proof archive, Merkle roots) survives a
//! serialize/restore cycle with its guard semantics intact. Storage is
//! format-agnostic; these tests cover both a self-describing format
//! (JSON) and a compact binary one (bincode).

#[cfg(test)]
mod tests {
    use qb_guards::{
        ChainHeightProvider, DoubleSpendGuard, MockChainHeightProvider, NonceGuard,
        NonceGuardConfig, NonceRecord, RateLimitConfig, RateLimitWindow, RateLimiter,
        SpentOutputSnapshot,
    };
    use qb_proof::proof::test_helpers::sample_request;
    use qb_proof::{build_batch, status_rules, MerkleBatch, ProofStatus, TransferProof};
    use shared_types::{Hash, ValidationError};
    use std::sync::Arc;

    fn nonce_guard() -> NonceGuard {
        NonceGuard::new(
            Arc::new(MockChainHeightProvider::new(100)) as Arc<dyn ChainHeightProvider>,
            NonceGuardConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_nonce_registry_survives_binary_round_trip() {
        let guard = nonce_guard();
        for nonce in [3u64, 7, 11] {
            guard.verify_and_register(nonce).await.unwrap();
        }

        let bytes = bincode::serialize(&guard.snapshot().await).unwrap();
        let records: Vec<NonceRecord> = bincode::deserialize(&bytes).unwrap();

        let restored = nonce_guard();
        restored.restore(records).await;
        for nonce in [3u64, 7, 11] {
            assert_eq!(
                restored.verify_and_register(nonce).await,
                Err(ValidationError::Replay(nonce))
            );
        }
        restored.verify_and_register(13).await.unwrap();
    }

    #[tokio::test]
    async fn test_spent_set_survives_json_round_trip() {
        let guard = DoubleSpendGuard::new();
        guard
            .check_and_mark(&[[1u8; 32], [2u8; 32]])
            .await
            .unwrap();

        let json = serde_json::to_vec(&guard.snapshot().await).unwrap();
        let snapshot: SpentOutputSnapshot = serde_json::from_slice(&json).unwrap();

        let restored = DoubleSpendGuard::new();
        restored.restore(snapshot).await;
        assert_eq!(
            restored.check_and_mark(&[[2u8; 32], [3u8; 32]]).await,
            Err(ValidationError::DoubleSpend)
        );
        // The rejected batch left nothing behind.
        assert!(!restored.is_spent(&[3u8; 32]).await);
    }

    #[test]
    fn test_rate_table_survives_round_trip_mid_window() {
        let config = RateLimitConfig {
            max_requests: 3,
            ..Default::default()
        };
        let limiter = RateLimiter::new(config);
        limiter.check_at("relayer-1", 5_000).unwrap();
        limiter.check_at("relayer-1", 6_000).unwrap();

        let bytes = bincode::serialize(&limiter.snapshot()).unwrap();
        let table: Vec<(String, RateLimitWindow)> = bincode::deserialize(&bytes).unwrap();

        let restored = RateLimiter::new(config);
        restored.restore(table);
        // One request of budget left in the restored window.
        restored.check_at("relayer-1", 7_000).unwrap();
        assert!(restored.check_at("relayer-1", 8_000).is_err());
    }

    #[test]
    fn test_proof_archive_round_trip_preserves_integrity() {
        let mut proof = TransferProof::create(sample_request()).unwrap();
        proof
            .update_status(ProofStatus::Confirmed, &status_rules())
            .unwrap();

        for bytes in [
            serde_json::to_vec(&proof).unwrap(),
            bincode::serialize(&proof).unwrap(),
        ] {
            let restored: TransferProof = if bytes.first() == Some(&b'{') {
                serde_json::from_slice(&bytes).unwrap()
            } else {
                bincode::deserialize(&bytes).unwrap()
            };
            assert_eq!(restored, proof);
            restored.verify().unwrap();
        }
    }

    #[test]
    fn test_merkle_batch_round_trip_still_proves_inclusion() {
        let leaves: Vec<Hash> = (0..5u8).map(|b| [b; 32]).collect();
        let batch = build_batch(&leaves).unwrap();

        let bytes = bincode::serialize(&batch).unwrap();
        let restored: MerkleBatch = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored.root, batch.root);
        for (i, leaf) in leaves.iter().enumerate() {
            assert!(qb_proof::verify_inclusion(
                leaf,
                restored.path_for(i).unwrap(),
                &restored.root
            ));
        }
    }

    #[tokio::test]
    async fn test_relayer_table_round_trip_preserves_revocations() {
        use qb_signatures::{AlgorithmId, RelayerRegistry, SignerIdentity};

        let registry = RelayerRegistry::new();
        registry.register_relayer([1u8; 20]);
        registry.register_relayer([2u8; 20]);
        registry
            .register_key(&[1u8; 20], AlgorithmId::SlhDsa, vec![0xAA; 32])
            .unwrap();
        registry
            .register_key(&[2u8; 20], AlgorithmId::SlhDsa, vec![0xBB; 32])
            .unwrap();
        registry
            .revoke_key(&[2u8; 20], AlgorithmId::SlhDsa)
            .unwrap();

        let json = serde_json::to_vec(&registry.snapshot()).unwrap();
        let identities: Vec<SignerIdentity> = serde_json::from_slice(&json).unwrap();

        let restored = RelayerRegistry::new();
        restored.restore(identities);
        assert_eq!(restored.candidates(AlgorithmId::SlhDsa).len(), 1);
        assert!(restored
            .active_key(&[2u8; 20], AlgorithmId::SlhDsa)
            .is_none());
    }
}
