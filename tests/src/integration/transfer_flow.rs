//! # Transfer Flow End to End
//!
//! A transfer proof's full life: creation, attestation, quorum, Merkle
//! anchoring, chain encodings, and the block audit that gates it.

#[cfg(test)]
mod tests {
    use qb_audit::{AuditConfig, BlockProvider, FraudAuditor, MockBlockProvider};
    use qb_guards::{DoubleSpendGuard, StateTransitionGuard};
    use qb_proof::proof::test_helpers::sample_request;
    use qb_proof::{
        build_batch, decode_evm, decode_solana, encode_evm, encode_solana, status_rules,
        ProofStatus, TransferProof,
    };
    use qb_signatures::{AlgorithmId, RelayerRegistry, SuiteKeypair, ThresholdVerifier};
    use shared_types::{BridgeBlock, BridgeTransaction, Hash};
    use std::sync::Arc;

    fn verifier_with_relayers(
        count: usize,
        algorithm: AlgorithmId,
    ) -> (Arc<ThresholdVerifier>, Vec<SuiteKeypair>) {
        let relayers = Arc::new(RelayerRegistry::new());
        let verifier = Arc::new(ThresholdVerifier::new(Arc::clone(&relayers)));
        let keypairs: Vec<SuiteKeypair> = (0..count)
            .map(|_| {
                let kp = verifier
                    .algorithms()
                    .suite(algorithm)
                    .unwrap()
                    .generate_keypair()
                    .unwrap();
                relayers.register_relayer(kp.address);
                if algorithm != AlgorithmId::Ecdsa {
                    relayers
                        .register_key(&kp.address, algorithm, kp.public_key.clone())
                        .unwrap();
                }
                kp
            })
            .collect();
        (verifier, keypairs)
    }

    #[test]
    fn test_proof_attestation_quorum_and_anchor() {
        let (verifier, keypairs) = verifier_with_relayers(3, AlgorithmId::Ecdsa);
        let rules = status_rules();

        // Three proofs, each attested by all three relayers.
        let mut proofs: Vec<TransferProof> = (0..3)
            .map(|i| {
                let mut request = sample_request();
                request.nonce = 100 + i;
                TransferProof::create(request).unwrap()
            })
            .collect();

        for proof in &mut proofs {
            for kp in &keypairs {
                let sig = verifier
                    .algorithms()
                    .suite(AlgorithmId::Ecdsa)
                    .unwrap()
                    .sign(&proof.hash, &kp.secret_key)
                    .unwrap();
                proof.add_signature(verifier.algorithms(), sig, None).unwrap();
            }
            let quorum = proof.verify_quorum(&verifier, 2).unwrap();
            assert_eq!(quorum.matched.len(), 2);
            proof.update_status(ProofStatus::Confirmed, &rules).unwrap();
        }

        // Anchor the batch and finalize.
        let leaves: Vec<Hash> = proofs.iter().map(|p| p.hash).collect();
        let batch = build_batch(&leaves).unwrap();
        for (i, proof) in proofs.iter_mut().enumerate() {
            proof.attach_merkle(batch.root, batch.path_for(i).unwrap().to_vec());
            proof.verify().unwrap();
            proof.update_status(ProofStatus::Finalized, &rules).unwrap();
        }
    }

    #[test]
    fn test_both_chain_encodings_round_trip_after_confirmation() {
        let proof = {
            let mut p = TransferProof::create(sample_request()).unwrap();
            p.update_status(ProofStatus::Confirmed, &status_rules())
                .unwrap();
            p
        };

        let evm = decode_evm(&encode_evm(&proof)).unwrap();
        assert_eq!(evm.request, proof.request);
        assert_eq!(evm.status, ProofStatus::Confirmed);

        let sol = decode_solana(&encode_solana(&proof).unwrap()).unwrap();
        assert_eq!(sol.request, proof.request);
        assert_eq!(sol.hash, proof.hash);
    }

    #[tokio::test]
    async fn test_block_with_instructionless_transaction_flags_index_one() {
        let (verifier, keypairs) = verifier_with_relayers(1, AlgorithmId::Ecdsa);
        let suite = verifier.algorithms().suite(AlgorithmId::Ecdsa).unwrap();

        let make_tx = |seed: u8, instructions: Vec<Vec<u8>>| {
            let message_hash: Hash = [seed; 32];
            let sig = suite.sign(&message_hash, &keypairs[0].secret_key).unwrap();
            BridgeTransaction {
                hash: [seed; 32],
                message_hash,
                signatures: vec![sig.to_wire()],
                instructions,
                inputs: vec![[seed; 32]],
                amount: 500,
                gas_estimate: 21_000,
            }
        };

        let block = BridgeBlock {
            height: 42,
            hash: [42u8; 32],
            parent_hash: [41u8; 32],
            timestamp: 1_700_000_000,
            transactions: vec![
                make_tx(1, vec![vec![0x01]]),
                make_tx(2, vec![]), // malformed: no instructions
                make_tx(3, vec![vec![0x03]]),
            ],
        };
        let provider = Arc::new(MockBlockProvider::new());
        provider.insert(block);

        let auditor = FraudAuditor::new(
            provider as Arc<dyn BlockProvider>,
            verifier,
            Arc::new(DoubleSpendGuard::new()),
            Arc::new(StateTransitionGuard::new()),
            AuditConfig {
                quorum_threshold: 1,
                ..Default::default()
            },
        );

        let result = auditor.detect_fraud_in_block(42).await.unwrap();
        assert!(result.fraud_detected);
        assert_eq!(result.failing_index, Some(1));
        assert!(result.reason.as_deref().unwrap().contains('1'));
    }

    #[tokio::test]
    async fn test_audit_with_pq_attestations() {
        let (verifier, keypairs) = verifier_with_relayers(2, AlgorithmId::MlDsa);
        let suite = verifier.algorithms().suite(AlgorithmId::MlDsa).unwrap();

        let message_hash: Hash = [9u8; 32];
        let signatures = keypairs
            .iter()
            .map(|kp| suite.sign(&message_hash, &kp.secret_key).unwrap().to_wire())
            .collect();
        let tx = BridgeTransaction {
            hash: [9u8; 32],
            message_hash,
            signatures,
            instructions: vec![vec![0x01]],
            inputs: vec![[9u8; 32]],
            amount: 500,
            gas_estimate: 21_000,
        };
        let provider = Arc::new(MockBlockProvider::new());
        provider.insert(BridgeBlock {
            height: 7,
            hash: [7u8; 32],
            parent_hash: [6u8; 32],
            timestamp: 1_700_000_000,
            transactions: vec![tx],
        });

        let auditor = FraudAuditor::new(
            provider as Arc<dyn BlockProvider>,
            verifier,
            Arc::new(DoubleSpendGuard::new()),
            Arc::new(StateTransitionGuard::new()),
            AuditConfig {
                quorum_threshold: 2,
                max_transaction_size: 32 * 1024,
                ..Default::default()
            },
        );

        let result = auditor.detect_fraud_in_block(7).await.unwrap();
        assert!(!result.fraud_detected, "reason: {:?}", result.reason);
    }
}
