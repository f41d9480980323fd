//! SQLite repository adapter.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};

use currency_types::{
    CurrencyRepository, DomainError, MutationOutcome, Rate, RepoError, Wallet, WalletNumber,
};

use crate::types::lite::{DbRate, DbWallet};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
///
/// SQLite has no `SELECT ... FOR UPDATE`; the pool is pinned to a single
/// connection, so every mutation serializes on the engine's one writer.
/// This also makes `sqlite::memory:` databases safe to pool.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn run_migrations(pool: &SqlitePool) -> Result<(), anyhow::Error> {
    let ddl = include_str!("../migrations/0001_create_tables.sql");
    for statement in ddl.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration 0001 failed: {}", e))?;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Transaction executor
// ─────────────────────────────────────────────────────────────────────────────

/// Runs a unit of work inside a database transaction.
///
/// Commits only when the work returns `Ok`. On `Err` the transaction is
/// rolled back and the work's original error is propagated unmasked; if the
/// rollback itself fails, that failure is surfaced instead while the
/// triggering cause is logged.
async fn run_in_tx<T, F>(pool: &SqlitePool, op: F) -> Result<T, RepoError>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, RepoError>> + Send,
{
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| RepoError::Transaction(e.to_string()))?;

    match op(&mut *tx).await {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| RepoError::Transaction(e.to_string()))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(cause = %err, error = %rollback_err, "rollback failed");
                return Err(RepoError::Transaction(rollback_err.to_string()));
            }
            Err(err)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallet store
// ─────────────────────────────────────────────────────────────────────────────
// Row-level operations over a bare connection, usable either standalone (via
// a pooled connection) or inside a transaction.

/// Reads a wallet row for mutation. Serialization comes from the
/// single-writer connection rather than a row lock.
async fn fetch_wallet_for_update(
    conn: &mut SqliteConnection,
    number: &str,
) -> Result<Option<DbWallet>, RepoError> {
    sqlx::query_as(
        r#"SELECT wallet_number, balance, created_at, updated_at
           FROM wallets WHERE wallet_number = ?"#,
    )
    .bind(number)
    .fetch_optional(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))
}

/// Inserts a new wallet row. A unique-constraint violation (a concurrent
/// creator won the race) is reported as a retryable conflict.
async fn insert_wallet(
    conn: &mut SqliteConnection,
    number: &str,
    balance: f64,
) -> Result<(), RepoError> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO wallets (wallet_number, balance, created_at, updated_at)
           VALUES (?, ?, ?, ?)"#,
    )
    .bind(number)
    .bind(balance)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await
    .map_err(|e| {
        if e.as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            RepoError::Conflict(format!("wallet {} was created concurrently", number))
        } else {
            RepoError::Database(e.to_string())
        }
    })?;

    Ok(())
}

/// Writes a new balance, touching `updated_at`. Returns whether a row was
/// affected.
async fn update_wallet_balance(
    conn: &mut SqliteConnection,
    number: &str,
    balance: f64,
) -> Result<bool, RepoError> {
    let now = Utc::now().to_rfc3339();

    let result =
        sqlx::query(r#"UPDATE wallets SET balance = ?, updated_at = ? WHERE wallet_number = ?"#)
            .bind(balance)
            .bind(&now)
            .bind(number)
            .execute(conn)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}

async fn fetch_all_wallets(conn: &mut SqliteConnection) -> Result<Vec<DbWallet>, RepoError> {
    sqlx::query_as(
        r#"SELECT wallet_number, balance, created_at, updated_at
           FROM wallets ORDER BY created_at ASC"#,
    )
    .fetch_all(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate store
// ─────────────────────────────────────────────────────────────────────────────

async fn insert_rate(conn: &mut SqliteConnection, value: f64) -> Result<(), RepoError> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(r#"INSERT INTO rates (value, timestamp) VALUES (?, ?)"#)
        .bind(value)
        .bind(&now)
        .execute(conn)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

    Ok(())
}

async fn fetch_latest_rates(
    conn: &mut SqliteConnection,
    limit: i64,
) -> Result<Vec<DbRate>, RepoError> {
    sqlx::query_as(
        r#"SELECT id, value, timestamp FROM rates ORDER BY timestamp DESC, id DESC LIMIT ?"#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))
}

async fn fetch_latest_rate(conn: &mut SqliteConnection) -> Result<Option<DbRate>, RepoError> {
    sqlx::query_as(
        r#"SELECT id, value, timestamp FROM rates ORDER BY timestamp DESC, id DESC LIMIT 1"#,
    )
    .fetch_optional(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CurrencyRepository for SqliteRepo {
    async fn save_rate(&self, value: f64) -> Result<(), RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        insert_rate(&mut conn, value).await
    }

    async fn latest_rates(&self, limit: i64) -> Result<Vec<Rate>, RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let rows = fetch_latest_rates(&mut conn, limit).await?;
        rows.into_iter().map(DbRate::into_domain).collect()
    }

    async fn latest_rate(&self) -> Result<Option<Rate>, RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let row = fetch_latest_rate(&mut conn).await?;
        row.map(DbRate::into_domain).transpose()
    }

    async fn apply_balance_delta(
        &self,
        number: &WalletNumber,
        amount: f64,
    ) -> Result<MutationOutcome, RepoError> {
        let target = number.clone();

        let result = run_in_tx(&self.pool, move |conn: &mut SqliteConnection| {
            Box::pin(async move {
                match fetch_wallet_for_update(&mut *conn, target.as_str()).await? {
                    None => {
                        if amount <= 0.0 {
                            return Err(RepoError::Domain(DomainError::WithdrawFromNonexistent));
                        }

                        insert_wallet(&mut *conn, target.as_str(), amount).await?;

                        Ok(MutationOutcome::Created {
                            number: target,
                            balance: amount,
                        })
                    }
                    Some(row) => {
                        let new_balance = row.balance + amount;
                        if new_balance < 0.0 {
                            return Err(RepoError::Domain(DomainError::InsufficientFunds {
                                balance: row.balance,
                            }));
                        }

                        if !update_wallet_balance(&mut *conn, target.as_str(), new_balance).await? {
                            return Err(RepoError::NotFound);
                        }

                        Ok(if amount >= 0.0 {
                            MutationOutcome::Deposited {
                                number: target,
                                balance: new_balance,
                            }
                        } else {
                            MutationOutcome::Withdrawn {
                                number: target,
                                balance: new_balance,
                            }
                        })
                    }
                }
            })
        })
        .await;

        // Insufficient funds rolls back like any business failure, but is a
        // classified outcome for the caller, not an error.
        match result {
            Err(RepoError::Domain(DomainError::InsufficientFunds { balance })) => {
                Ok(MutationOutcome::InsufficientFunds {
                    number: number.clone(),
                    balance,
                })
            }
            other => other,
        }
    }

    async fn deduct(
        &self,
        number: &WalletNumber,
        amount: f64,
    ) -> Result<MutationOutcome, RepoError> {
        let target = number.clone();

        let result = run_in_tx(&self.pool, move |conn: &mut SqliteConnection| {
            Box::pin(async move {
                let row = fetch_wallet_for_update(&mut *conn, target.as_str())
                    .await?
                    .ok_or(RepoError::NotFound)?;

                if row.balance < amount {
                    return Err(RepoError::Domain(DomainError::InsufficientFunds {
                        balance: row.balance,
                    }));
                }

                let remaining = row.balance - amount;
                if !update_wallet_balance(&mut *conn, target.as_str(), remaining).await? {
                    return Err(RepoError::NotFound);
                }

                Ok(MutationOutcome::Withdrawn {
                    number: target,
                    balance: remaining,
                })
            })
        })
        .await;

        match result {
            Err(RepoError::Domain(DomainError::InsufficientFunds { balance })) => {
                Ok(MutationOutcome::InsufficientFunds {
                    number: number.clone(),
                    balance,
                })
            }
            other => other,
        }
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>, RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let rows = fetch_all_wallets(&mut conn).await?;
        rows.into_iter().map(DbWallet::into_domain).collect()
    }

    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }
}
