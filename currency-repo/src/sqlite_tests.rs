//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use currency_types::{
        CurrencyRepository, DomainError, MutationOutcome, RepoError, WalletNumber,
    };

    use crate::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn number(raw: &str) -> WalletNumber {
        WalletNumber::parse(raw).unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Balance mutation
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_first_positive_delta_creates_wallet() {
        let repo = setup_repo().await;

        let outcome = repo
            .apply_balance_delta(&number("1234567"), 100.5)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::Created {
                number: number("1234567"),
                balance: 100.5
            }
        );

        let wallets = repo.list_wallets().await.unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].number.as_str(), "1234567");
        assert_eq!(wallets[0].balance, 100.5);
    }

    #[tokio::test]
    async fn test_deposit_to_existing_wallet_adds() {
        let repo = setup_repo().await;

        repo.apply_balance_delta(&number("1234567"), 50.0)
            .await
            .unwrap();
        let outcome = repo
            .apply_balance_delta(&number("1234567"), 25.5)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::Deposited {
                number: number("1234567"),
                balance: 75.5
            }
        );
    }

    #[tokio::test]
    async fn test_withdraw_subtracts() {
        let repo = setup_repo().await;

        repo.apply_balance_delta(&number("1234567"), 100.0)
            .await
            .unwrap();
        let outcome = repo
            .apply_balance_delta(&number("1234567"), -30.0)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::Withdrawn {
                number: number("1234567"),
                balance: 70.0
            }
        );
    }

    #[tokio::test]
    async fn test_withdraw_to_exactly_zero_is_allowed() {
        let repo = setup_repo().await;

        repo.apply_balance_delta(&number("1234567"), 40.0)
            .await
            .unwrap();
        let outcome = repo
            .apply_balance_delta(&number("1234567"), -40.0)
            .await
            .unwrap();

        assert_eq!(outcome.balance(), 0.0);
    }

    #[tokio::test]
    async fn test_overdraw_reports_unchanged_balance() {
        let repo = setup_repo().await;

        repo.apply_balance_delta(&number("1234567"), 100.0)
            .await
            .unwrap();
        let outcome = repo
            .apply_balance_delta(&number("1234567"), -100.01)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::InsufficientFunds {
                number: number("1234567"),
                balance: 100.0
            }
        );

        // Nothing was committed: the stored balance is untouched.
        let wallets = repo.list_wallets().await.unwrap();
        assert_eq!(wallets[0].balance, 100.0);
    }

    #[tokio::test]
    async fn test_withdraw_from_nonexistent_creates_no_row() {
        let repo = setup_repo().await;

        let result = repo.apply_balance_delta(&number("7654321"), -10.0).await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::WithdrawFromNonexistent))
        ));

        assert!(repo.list_wallets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_delta_on_nonexistent_is_rejected() {
        let repo = setup_repo().await;

        let result = repo.apply_balance_delta(&number("7654321"), 0.0).await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::WithdrawFromNonexistent))
        ));
        assert!(repo.list_wallets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_delta_on_existing_wallet_is_a_deposit() {
        let repo = setup_repo().await;

        repo.apply_balance_delta(&number("1234567"), 10.0)
            .await
            .unwrap();
        let outcome = repo
            .apply_balance_delta(&number("1234567"), 0.0)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::Deposited {
                number: number("1234567"),
                balance: 10.0
            }
        );
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Deduction (conversion engine)
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_deduct_exact_amount() {
        let repo = setup_repo().await;

        repo.apply_balance_delta(&number("1234567"), 200.0)
            .await
            .unwrap();

        // 1.5 * 90.5 as computed by the conversion engine.
        let outcome = repo.deduct(&number("1234567"), 135.75).await.unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::Withdrawn {
                number: number("1234567"),
                balance: 64.25
            }
        );
    }

    #[tokio::test]
    async fn test_deduct_missing_wallet_not_found() {
        let repo = setup_repo().await;

        let result = repo.deduct(&number("0000001"), 1.0).await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_deduct_insufficient_leaves_balance_unchanged() {
        let repo = setup_repo().await;

        repo.apply_balance_delta(&number("1234567"), 50.0)
            .await
            .unwrap();
        let outcome = repo.deduct(&number("1234567"), 50.5).await.unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::InsufficientFunds {
                number: number("1234567"),
                balance: 50.0
            }
        );

        let wallets = repo.list_wallets().await.unwrap();
        assert_eq!(wallets[0].balance, 50.0);
    }

    #[tokio::test]
    async fn test_deduct_entire_balance() {
        let repo = setup_repo().await;

        repo.apply_balance_delta(&number("1234567"), 135.75)
            .await
            .unwrap();
        let outcome = repo.deduct(&number("1234567"), 135.75).await.unwrap();

        assert_eq!(outcome.balance(), 0.0);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Listing
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_wallets_ordered_by_creation() {
        let repo = setup_repo().await;

        repo.apply_balance_delta(&number("1111111"), 1.0)
            .await
            .unwrap();
        repo.apply_balance_delta(&number("2222222"), 2.0)
            .await
            .unwrap();
        repo.apply_balance_delta(&number("3333333"), 3.0)
            .await
            .unwrap();

        let wallets = repo.list_wallets().await.unwrap();
        let numbers: Vec<&str> = wallets.iter().map(|w| w.number.as_str()).collect();

        assert_eq!(numbers, vec!["1111111", "2222222", "3333333"]);
    }

    #[tokio::test]
    async fn test_list_wallets_empty() {
        let repo = setup_repo().await;

        assert!(repo.list_wallets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_updated_at_touched_on_mutation() {
        let repo = setup_repo().await;

        repo.apply_balance_delta(&number("1234567"), 10.0)
            .await
            .unwrap();
        let before = repo.list_wallets().await.unwrap()[0].clone();

        repo.apply_balance_delta(&number("1234567"), 10.0)
            .await
            .unwrap();
        let after = repo.list_wallets().await.unwrap()[0].clone();

        assert_eq!(before.created_at, after.created_at);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.balance, 20.0);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Rates
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_latest_rate_none_when_empty() {
        let repo = setup_repo().await;

        assert!(repo.latest_rate().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_rate_is_most_recent() {
        let repo = setup_repo().await;

        repo.save_rate(88.0).await.unwrap();
        repo.save_rate(89.0).await.unwrap();
        repo.save_rate(90.5).await.unwrap();

        let rate = repo.latest_rate().await.unwrap().unwrap();
        assert_eq!(rate.value, 90.5);
    }

    #[tokio::test]
    async fn test_latest_rates_limit_and_order() {
        let repo = setup_repo().await;

        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            repo.save_rate(value).await.unwrap();
        }

        let rates = repo.latest_rates(3).await.unwrap();
        let values: Vec<f64> = rates.iter().map(|r| r.value).collect();

        assert_eq!(values, vec![5.0, 4.0, 3.0]);
    }

    #[tokio::test]
    async fn test_latest_rates_limit_larger_than_stored() {
        let repo = setup_repo().await;

        repo.save_rate(7.5).await.unwrap();

        let rates = repo.latest_rates(10).await.unwrap();
        assert_eq!(rates.len(), 1);
    }

    #[tokio::test]
    async fn test_ping() {
        let repo = setup_repo().await;

        repo.ping().await.unwrap();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Concurrency
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_concurrent_deposits_lose_no_updates() {
        let repo = Arc::new(setup_repo().await);
        let target = number("1234567");

        repo.apply_balance_delta(&target, 100.0).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let repo = Arc::clone(&repo);
            let target = target.clone();
            handles.push(tokio::spawn(async move {
                repo.apply_balance_delta(&target, 10.0).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let wallets = repo.list_wallets().await.unwrap();
        assert_eq!(wallets[0].balance, 100.0 + 16.0 * 10.0);
    }

    #[tokio::test]
    async fn test_concurrent_mixed_mutations_keep_balance_consistent() {
        let repo = Arc::new(setup_repo().await);
        let target = number("7654321");

        repo.apply_balance_delta(&target, 1000.0).await.unwrap();

        // 8 deposits of 5.0 and 8 withdrawals of 3.0, all racing.
        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = Arc::clone(&repo);
            let target = target.clone();
            let delta = if i % 2 == 0 { 5.0 } else { -3.0 };
            handles.push(tokio::spawn(async move {
                repo.apply_balance_delta(&target, delta).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let wallets = repo.list_wallets().await.unwrap();
        assert_eq!(wallets[0].balance, 1000.0 + 8.0 * 5.0 - 8.0 * 3.0);
    }

    #[tokio::test]
    async fn test_balance_never_negative_under_mixed_sequences() {
        let repo = setup_repo().await;
        let target = number("5550001");

        repo.apply_balance_delta(&target, 20.0).await.unwrap();

        // Deterministic pseudo-random walk of deposits and (over)withdrawals.
        let mut state: u64 = 0x9E37_79B9;
        for _ in 0..64 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let magnitude = ((state >> 33) % 1000) as f64 / 10.0;
            let delta = if state % 3 == 0 { magnitude } else { -magnitude };

            let outcome = repo.apply_balance_delta(&target, delta).await.unwrap();

            assert!(
                outcome.balance() >= 0.0,
                "balance went negative: {}",
                outcome.balance()
            );
            let stored = repo.list_wallets().await.unwrap()[0].balance;
            assert!(stored >= 0.0);
            assert_eq!(stored, outcome.balance());
        }
    }
}
