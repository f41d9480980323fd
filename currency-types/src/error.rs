//! Error types for the currency service.

/// Domain-level errors (business logic violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Wallet number must be exactly 7 digits, got {got:?}")]
    InvalidWalletNumber { got: String },

    #[error("Cannot withdraw from a nonexistent wallet")]
    WithdrawFromNonexistent,

    #[error("Insufficient funds: current balance {balance}")]
    InsufficientFunds { balance: f64 },
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A race on concurrent wallet creation. Safe to retry: nothing was
    /// committed on the losing side.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No exchange rate recorded")]
    RateUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(DomainError::InsufficientFunds { balance }) => {
                // Normally reclassified into a MutationOutcome before it
                // reaches this layer; kept as a conflict if it escapes.
                AppError::Conflict(format!("Insufficient funds: current balance {}", balance))
            }
            RepoError::Domain(e) => AppError::BadRequest(e.to_string()),
            RepoError::NotFound => AppError::NotFound("Wallet not found".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::Conflict(e),
        }
    }
}
