//! Batch repository port.

use async_trait::async_trait;

use crate::domain::foundation::{BatchId, DomainError};
use crate::domain::fulfillment::Batch;

/// Port for batch (cohort) lookups.
#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// Looks up a batch by id.
    async fn find_by_id(&self, id: &BatchId) -> Result<Option<Batch>, DomainError>;

    /// Looks up a batch by its unique name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Batch>, DomainError>;
}
