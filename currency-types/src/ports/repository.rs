//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite) will implement this trait.

use crate::domain::{MutationOutcome, Rate, Wallet, WalletNumber};
use crate::error::RepoError;

/// The main repository port for rate and wallet operations.
///
/// All operations that modify balances MUST be atomic: implementations open
/// a database transaction whose first operation is an exclusive locked read
/// of the target wallet row, so concurrent mutations of the same wallet
/// serialize while different wallets proceed in parallel.
#[async_trait::async_trait]
pub trait CurrencyRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Rate Operations (append-only, read without locking)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Appends a rate observation, timestamped now.
    async fn save_rate(&self, value: f64) -> Result<(), RepoError>;

    /// Reads up to `limit` most recent rates, newest first.
    async fn latest_rates(&self, limit: i64) -> Result<Vec<Rate>, RepoError>;

    /// Reads the single most recent rate, if any.
    async fn latest_rate(&self) -> Result<Option<Rate>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Wallet Operations (MUST be atomic)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Applies a signed balance delta, creating the wallet on a first
    /// positive deposit.
    ///
    /// Errors: `Domain(WithdrawFromNonexistent)` when the wallet is absent
    /// and `amount <= 0`; `Conflict` when an insert races a concurrent
    /// creator (safe to retry, nothing was committed).
    async fn apply_balance_delta(
        &self,
        number: &WalletNumber,
        amount: f64,
    ) -> Result<MutationOutcome, RepoError>;

    /// Deducts an exact amount from an existing wallet.
    ///
    /// Returns `Withdrawn` with the remaining balance, or
    /// `InsufficientFunds` with the unchanged balance. Errors with
    /// `NotFound` when the wallet does not exist.
    async fn deduct(
        &self,
        number: &WalletNumber,
        amount: f64,
    ) -> Result<MutationOutcome, RepoError>;

    /// Lists all wallets, ordered by creation time.
    async fn list_wallets(&self) -> Result<Vec<Wallet>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Health
    // ─────────────────────────────────────────────────────────────────────────────

    /// Verifies storage reachability.
    async fn ping(&self) -> Result<(), RepoError>;
}
