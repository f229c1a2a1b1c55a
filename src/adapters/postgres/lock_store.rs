//! PostgreSQL implementation of ProcessingLockStore.
//!
//! The database-row-as-mutex pattern: a `processing_locks` row's existence
//! is the lock, and the primary key makes acquisition a single atomic
//! insert. There is deliberately no separate existence check followed by an
//! insert; that would reopen the race window this table exists to close.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::ports::ProcessingLockStore;

/// PostgreSQL implementation of the ProcessingLockStore port.
pub struct PostgresLockStore {
    pool: PgPool,
}

impl PostgresLockStore {
    /// Creates a new lock store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessingLockStore for PostgresLockStore {
    async fn acquire(&self, payment_id: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("INSERT INTO processing_locks (payment_id) VALUES ($1)")
            .bind(payment_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(true),
            // A duplicate key means another holder is in flight; that is the
            // negative answer, not an error.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(false),
            Err(e) => Err(DomainError::database(format!(
                "Failed to acquire processing lock: {}",
                e
            ))),
        }
    }

    async fn release(&self, payment_id: &str) -> Result<(), DomainError> {
        // Zero rows deleted is fine: release must be safe to call
        // unconditionally from cleanup paths.
        sqlx::query("DELETE FROM processing_locks WHERE payment_id = $1")
            .bind(payment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to release processing lock: {}", e))
            })?;

        Ok(())
    }
}
