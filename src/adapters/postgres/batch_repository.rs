//! PostgreSQL implementation of BatchRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{BatchId, DomainError, Timestamp};
use crate::domain::fulfillment::Batch;
use crate::ports::BatchRepository;

/// PostgreSQL implementation of the BatchRepository port.
pub struct PostgresBatchRepository {
    pool: PgPool,
}

impl PostgresBatchRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a batch.
#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: Uuid,
    name: String,
    telegram_chat_id: String,
    created_at: DateTime<Utc>,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        Batch {
            id: BatchId::from_uuid(row.id),
            name: row.name,
            telegram_chat_id: row.telegram_chat_id,
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

#[async_trait]
impl BatchRepository for PostgresBatchRepository {
    async fn find_by_id(&self, id: &BatchId) -> Result<Option<Batch>, DomainError> {
        let row: Option<BatchRow> = sqlx::query_as(
            "SELECT id, name, telegram_chat_id, created_at FROM batches WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find batch: {}", e)))?;

        Ok(row.map(Batch::from))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Batch>, DomainError> {
        let row: Option<BatchRow> = sqlx::query_as(
            "SELECT id, name, telegram_chat_id, created_at FROM batches WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find batch by name: {}", e)))?;

        Ok(row.map(Batch::from))
    }
}
