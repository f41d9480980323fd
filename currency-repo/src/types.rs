//! Database row types for the PostgreSQL and SQLite adapters.
//!
//! The two engines store timestamps differently (TIMESTAMPTZ vs RFC 3339
//! TEXT), so each backend gets its own row structs with an `into_domain`
//! conversion.

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL rows
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "postgres")]
pub mod pg {
    use chrono::{DateTime, Utc};
    use sqlx::FromRow;

    use currency_types::{Rate, RepoError, Wallet, WalletNumber};

    /// Wallet row from database.
    #[derive(FromRow)]
    pub struct DbWallet {
        pub wallet_number: String,
        pub balance: f64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Rate row from database.
    #[derive(FromRow)]
    pub struct DbRate {
        pub id: i64,
        pub value: f64,
        pub timestamp: DateTime<Utc>,
    }

    impl DbWallet {
        /// Convert database row to domain Wallet.
        pub fn into_domain(self) -> Result<Wallet, RepoError> {
            let number = WalletNumber::parse(&self.wallet_number)
                .map_err(|e| RepoError::Database(e.to_string()))?;

            Ok(Wallet {
                number,
                balance: self.balance,
                created_at: self.created_at,
                updated_at: self.updated_at,
            })
        }
    }

    impl DbRate {
        /// Convert database row to domain Rate.
        pub fn into_domain(self) -> Result<Rate, RepoError> {
            Ok(Rate {
                id: self.id,
                value: self.value,
                timestamp: self.timestamp,
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite rows
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "sqlite")]
pub mod lite {
    use chrono::{DateTime, Utc};
    use sqlx::FromRow;

    use currency_types::{Rate, RepoError, Wallet, WalletNumber};

    /// Wallet row from database (timestamps stored as RFC 3339 text).
    #[derive(FromRow)]
    pub struct DbWallet {
        pub wallet_number: String,
        pub balance: f64,
        pub created_at: String,
        pub updated_at: String,
    }

    /// Rate row from database (timestamp stored as RFC 3339 text).
    #[derive(FromRow)]
    pub struct DbRate {
        pub id: i64,
        pub value: f64,
        pub timestamp: String,
    }

    fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepoError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepoError::Database(e.to_string()))
    }

    impl DbWallet {
        /// Convert database row to domain Wallet.
        pub fn into_domain(self) -> Result<Wallet, RepoError> {
            let number = WalletNumber::parse(&self.wallet_number)
                .map_err(|e| RepoError::Database(e.to_string()))?;

            Ok(Wallet {
                number,
                balance: self.balance,
                created_at: parse_timestamp(&self.created_at)?,
                updated_at: parse_timestamp(&self.updated_at)?,
            })
        }
    }

    impl DbRate {
        /// Convert database row to domain Rate.
        pub fn into_domain(self) -> Result<Rate, RepoError> {
            Ok(Rate {
                id: self.id,
                value: self.value,
                timestamp: parse_timestamp(&self.timestamp)?,
            })
        }
    }
}
