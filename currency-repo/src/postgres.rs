//! PostgreSQL repository adapter.

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};

use currency_types::{
    CurrencyRepository, DomainError, MutationOutcome, Rate, RepoError, Wallet, WalletNumber,
};

use crate::types::pg::{DbRate, DbWallet};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository with row-level locking.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_tables_pg.sql"),
        "0001",
    )
    .await?;

    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
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
async fn run_in_tx<T, F>(pool: &PgPool, op: F) -> Result<T, RepoError>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, RepoError>> + Send,
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

/// Reads a wallet row with an exclusive row lock (`FOR UPDATE`), held until
/// the enclosing transaction ends. Must be the first operation inside a
/// mutation transaction.
async fn fetch_wallet_for_update(
    conn: &mut PgConnection,
    number: &str,
) -> Result<Option<DbWallet>, RepoError> {
    sqlx::query_as(
        r#"SELECT wallet_number, balance, created_at, updated_at
           FROM wallets WHERE wallet_number = $1 FOR UPDATE"#,
    )
    .bind(number)
    .fetch_optional(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))
}

/// Inserts a new wallet row. A unique-constraint violation (a concurrent
/// creator won the race) is reported as a retryable conflict.
async fn insert_wallet(
    conn: &mut PgConnection,
    number: &str,
    balance: f64,
) -> Result<(), RepoError> {
    sqlx::query(r#"INSERT INTO wallets (wallet_number, balance) VALUES ($1, $2)"#)
        .bind(number)
        .bind(balance)
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
    conn: &mut PgConnection,
    number: &str,
    balance: f64,
) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"UPDATE wallets SET balance = $1, updated_at = NOW() WHERE wallet_number = $2"#,
    )
    .bind(balance)
    .bind(number)
    .execute(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}

async fn fetch_all_wallets(conn: &mut PgConnection) -> Result<Vec<DbWallet>, RepoError> {
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

async fn insert_rate(conn: &mut PgConnection, value: f64) -> Result<(), RepoError> {
    sqlx::query(r#"INSERT INTO rates (value) VALUES ($1)"#)
        .bind(value)
        .execute(conn)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

    Ok(())
}

async fn fetch_latest_rates(
    conn: &mut PgConnection,
    limit: i64,
) -> Result<Vec<DbRate>, RepoError> {
    sqlx::query_as(
        r#"SELECT id, value, timestamp FROM rates ORDER BY timestamp DESC, id DESC LIMIT $1"#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))
}

async fn fetch_latest_rate(conn: &mut PgConnection) -> Result<Option<DbRate>, RepoError> {
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
impl CurrencyRepository for PostgresRepo {
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

        let result = run_in_tx(&self.pool, move |conn: &mut PgConnection| {
            Box::pin(async move {
                // Lock first; everything after happens under the row lock.
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

        let result = run_in_tx(&self.pool, move |conn: &mut PgConnection| {
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
