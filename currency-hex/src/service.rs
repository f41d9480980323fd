//! Currency Application Service
//!
//! Orchestrates domain operations through the repository port.
//! Contains NO infrastructure logic - pure business orchestration.

use currency_types::{
    AppError, AverageResponse, BalanceUpdateRequest, ConvertRequest, CurrencyRepository,
    MutationOutcome, RepoError, Wallet, WalletNumber,
};

/// Outcome of a conversion attempt, before it is shaped into a response.
///
/// `converted_amount` is the product `amount_to_convert * rate_used`, and is
/// exactly what the deduction engine was asked to subtract; the tagged
/// `outcome` tells whether it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub number: WalletNumber,
    pub rate_used: f64,
    pub converted_amount: f64,
    pub outcome: MutationOutcome,
}

/// Application service for rate and wallet operations.
///
/// Generic over `R: CurrencyRepository` - the adapter is injected at compile
/// time. This enables:
/// - Swapping repositories without code changes
/// - Testing with an in-memory repo
/// - Compile-time checks for port implementation
pub struct CurrencyService<R: CurrencyRepository> {
    repo: R,
}

impl<R: CurrencyRepository> CurrencyService<R> {
    /// Creates a new currency service with the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Rate Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Records a rate observation.
    pub async fn record_rate(&self, value: f64) -> Result<(), AppError> {
        if value <= 0.0 {
            return Err(AppError::BadRequest("Rate value must be positive".into()));
        }

        self.repo.save_rate(value).await.map_err(Into::into)
    }

    /// Computes the arithmetic mean of the `limit` most recent rates.
    pub async fn average_rate(&self, limit: i64) -> Result<AverageResponse, AppError> {
        if limit <= 0 {
            return Err(AppError::BadRequest("Limit must be positive".into()));
        }

        let rates = self.repo.latest_rates(limit).await?;

        if rates.is_empty() {
            return Ok(AverageResponse {
                average: 0.0,
                count: 0,
            });
        }

        let sum: f64 = rates.iter().map(|r| r.value).sum();

        Ok(AverageResponse {
            average: sum / rates.len() as f64,
            count: rates.len() as i64,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Wallet Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a wallet or applies a signed balance delta to it.
    ///
    /// The wallet number is validated here, before any transaction is
    /// opened; a malformed identifier never reaches storage.
    pub async fn update_balance(
        &self,
        req: BalanceUpdateRequest,
    ) -> Result<MutationOutcome, AppError> {
        let number = WalletNumber::parse(&req.wallet_number)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        self.repo
            .apply_balance_delta(&number, req.amount)
            .await
            .map_err(Into::into)
    }

    /// Lists all wallets, oldest first.
    pub async fn list_wallets(&self) -> Result<Vec<Wallet>, AppError> {
        self.repo.list_wallets().await.map_err(Into::into)
    }

    /// Converts a quantity at the latest rate and deducts the product from
    /// the source wallet.
    ///
    /// The rate is read outside the wallet transaction: rate rows are
    /// append-only and independent of wallet state, so the lock is not held
    /// across the rate query. The rate used may be marginally stale relative
    /// to commit time, which is accepted.
    pub async fn convert_and_deduct(&self, req: ConvertRequest) -> Result<Conversion, AppError> {
        let number = WalletNumber::parse(&req.source_wallet_number)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if req.amount_to_convert <= 0.0 {
            return Err(AppError::BadRequest(
                "Amount to convert must be positive".into(),
            ));
        }

        let rate = self
            .repo
            .latest_rate()
            .await?
            .ok_or(AppError::RateUnavailable)?;

        let deduction = req.amount_to_convert * rate.value;

        let outcome = self
            .repo
            .deduct(&number, deduction)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => AppError::NotFound(format!("Wallet {} not found", number)),
                other => other.into(),
            })?;

        Ok(Conversion {
            number,
            rate_used: rate.value,
            converted_amount: deduction,
            outcome,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Health
    // ─────────────────────────────────────────────────────────────────────────────

    /// Verifies that storage is reachable.
    pub async fn health(&self) -> Result<(), AppError> {
        self.repo.ping().await.map_err(Into::into)
    }
}
