//! # Quorum and Hybrid Properties
//!
//! Threshold behavior with mixed algorithms, duplicates, and hybrid AND
//! semantics, exercised through the public crate surfaces.

#[cfg(test)]
mod tests {
    use qb_signatures::domain::ecdsa::keccak256;
    use qb_signatures::{
        AlgorithmId, BridgeSignature, PqSignature, RelayerRegistry, SuiteKeypair,
        ThresholdVerifier,
    };
    use shared_types::{Hash, ValidationError};
    use std::sync::Arc;

    struct Harness {
        relayers: Arc<RelayerRegistry>,
        verifier: ThresholdVerifier,
    }

    impl Harness {
        fn new() -> Self {
            let relayers = Arc::new(RelayerRegistry::new());
            let verifier = ThresholdVerifier::new(Arc::clone(&relayers));
            Self { relayers, verifier }
        }

        fn enroll(&self, algorithm: AlgorithmId) -> SuiteKeypair {
            let keypair = self
                .verifier
                .algorithms()
                .suite(algorithm)
                .unwrap()
                .generate_keypair()
                .unwrap();
            self.relayers.register_relayer(keypair.address);
            if algorithm != AlgorithmId::Ecdsa {
                self.relayers
                    .register_key(&keypair.address, algorithm, keypair.public_key.clone())
                    .unwrap();
            }
            keypair
        }

        fn sign(&self, keypair: &SuiteKeypair, message: &Hash) -> BridgeSignature {
            self.verifier
                .algorithms()
                .suite(keypair.algorithm)
                .unwrap()
                .sign(message, &keypair.secret_key)
                .unwrap()
        }
    }

    #[test]
    fn test_threshold_met_with_duplicates_and_noise() {
        let harness = Harness::new();
        let message = keccak256(b"t plus k submissions");

        // T = 3 distinct signers, plus k = 3 useless submissions.
        let signers: Vec<_> = (0..3)
            .map(|_| harness.enroll(AlgorithmId::Ecdsa))
            .collect();
        let mut submissions: Vec<BridgeSignature> = Vec::new();
        submissions.push(harness.sign(&signers[0], &message)); // duplicate below
        submissions.push(harness.sign(&signers[0], &message));
        submissions.push(BridgeSignature::MlDsa(PqSignature(vec![0u8; 3309]))); // garbage
        submissions.push(harness.sign(&signers[1], &message));
        submissions.push(harness.sign(&signers[2], &message));
        submissions.push(harness.sign(&signers[2], &keccak256(b"stale"))); // wrong message

        let result = harness
            .verifier
            .verify_quorum(&message, &submissions, 3)
            .unwrap();
        assert_eq!(result.matched.len(), 3);
    }

    #[test]
    fn test_threshold_minus_one_distinct_fails() {
        let harness = Harness::new();
        let message = keccak256(b"t minus one");
        let a = harness.enroll(AlgorithmId::Ecdsa);
        let b = harness.enroll(AlgorithmId::MlDsa);

        // Two distinct signers, one of them submitting three times.
        let submissions = vec![
            harness.sign(&a, &message),
            harness.sign(&a, &message),
            harness.sign(&a, &message),
            harness.sign(&b, &message),
        ];
        assert_eq!(
            harness.verifier.verify_quorum(&message, &submissions, 3),
            Err(ValidationError::QuorumNotMet {
                matched: 2,
                required: 3,
            })
        );
    }

    #[test]
    fn test_hybrid_and_semantics_across_quorum() {
        let harness = Harness::new();
        let message = keccak256(b"hybrid and semantics");
        let hybrid = harness.enroll(AlgorithmId::HybridSlhDsa);

        let signed = harness.sign(&hybrid, &message);
        let BridgeSignature::HybridSlhDsa(mut parts) = signed.clone() else {
            panic!("wrong variant");
        };

        // Intact hybrid counts.
        harness
            .verifier
            .verify_quorum(&message, &[signed], 1)
            .unwrap();

        // Valid classical half plus corrupted post-quantum half does not.
        let pq_len = parts.post_quantum.as_bytes().len();
        parts.post_quantum = PqSignature(vec![0u8; pq_len]);
        assert!(harness
            .verifier
            .verify_quorum(&message, &[BridgeSignature::HybridSlhDsa(parts)], 1)
            .is_err());
    }

    #[test]
    fn test_unregistered_hybrid_relayer_never_counts() {
        let harness = Harness::new();
        let message = keccak256(b"outsider hybrid");

        // Keypair never registered anywhere.
        let outsider = harness
            .verifier
            .algorithms()
            .suite(AlgorithmId::HybridMlDsa)
            .unwrap()
            .generate_keypair()
            .unwrap();
        let sig = harness
            .verifier
            .algorithms()
            .suite(AlgorithmId::HybridMlDsa)
            .unwrap()
            .sign(&message, &outsider.secret_key)
            .unwrap();

        assert!(harness.verifier.verify_quorum(&message, &[sig], 1).is_err());
    }

    #[test]
    fn test_wire_round_trip_preserves_quorum() {
        let harness = Harness::new();
        let message = keccak256(b"wire quorum");
        let signers = [
            harness.enroll(AlgorithmId::Ecdsa),
            harness.enroll(AlgorithmId::SlhDsa),
        ];

        // Encode to the transport form and back, as the auditor does.
        let submissions: Vec<BridgeSignature> = signers
            .iter()
            .map(|kp| {
                let wire = harness.sign(kp, &message).to_wire();
                BridgeSignature::from_wire(&wire).unwrap()
            })
            .collect();

        let result = harness
            .verifier
            .verify_quorum(&message, &submissions, 2)
            .unwrap();
        assert_eq!(result.matched.len(), 2);
    }
}
