//! # Guard Concurrency Properties
//!
//! Races on the nonce and double-spend critical sections, plus rate-limit
//! window behavior under bursts.

#[cfg(test)]
mod tests {
    use qb_guards::{
        ChainHeightProvider, DoubleSpendGuard, MockChainHeightProvider, NonceGuard,
        NonceGuardConfig, RateLimitConfig, RateLimiter,
    };
    use shared_types::{Hash, ValidationError};
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_identical_nonce_has_one_winner() {
        let provider = Arc::new(MockChainHeightProvider::new(100));
        let guard = Arc::new(NonceGuard::new(
            provider as Arc<dyn ChainHeightProvider>,
            NonceGuardConfig::default(),
        ));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let guard = Arc::clone(&guard);
                tokio::spawn(async move { guard.verify_and_register(777).await })
            })
            .collect();

        let mut successes = 0;
        let mut replays = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(ValidationError::Replay(777)) => replays += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(replays, 31);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_double_spend_has_one_winner() {
        let guard = Arc::new(DoubleSpendGuard::new());
        let contested: Hash = [0xAB; 32];

        let handles: Vec<_> = (0..16u8)
            .map(|i| {
                let guard = Arc::clone(&guard);
                tokio::spawn(async move {
                    // Each task pairs the contested input with a unique one.
                    guard.check_and_mark(&[contested, [i; 32]]).await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        // Only the winner's unique input was marked alongside the
        // contested one.
        assert_eq!(guard.len().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_distinct_nonces_all_pass_concurrently() {
        let provider = Arc::new(MockChainHeightProvider::new(100));
        let guard = Arc::new(NonceGuard::new(
            provider as Arc<dyn ChainHeightProvider>,
            NonceGuardConfig::default(),
        ));

        let handles: Vec<_> = (0..64u64)
            .map(|nonce| {
                let guard = Arc::clone(&guard);
                tokio::spawn(async move { guard.verify_and_register(nonce).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(guard.len().await, 64);
    }

    #[test]
    fn test_rate_limit_default_window_boundary() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let start = 1_000_000;

        for i in 0..60 {
            limiter.check_at("relayer-1", start + i * 500).unwrap();
        }
        assert!(matches!(
            limiter.check_at("relayer-1", start + 59_999),
            Err(ValidationError::ResourceLimitExceeded(_))
        ));
        // One window after the window start the counter resets.
        limiter.check_at("relayer-1", start + 60_000).unwrap();
    }

    #[test]
    fn test_rate_limit_burst_from_many_clients() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        for client in 0..100 {
            let id = format!("relayer-{client}");
            for i in 0..60 {
                limiter.check_at(&id, 10_000 + i).unwrap();
            }
            assert!(limiter.check_at(&id, 10_100).is_err());
        }
        assert_eq!(limiter.tracked_clients(), 100);
    }
}
