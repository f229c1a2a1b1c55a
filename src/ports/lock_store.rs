//! Processing lock store port.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Persistence-backed mutual exclusion keyed by provider payment id.
///
/// A lock row's mere existence is the lock. `acquire` must be a single
/// atomic operation from the caller's point of view: no existence check
/// followed by an insert, which would open a race window. A leaked lock
/// permanently blocks reprocessing of its payment id until manually
/// cleared, so whichever code path acquired it must release on every exit
/// path.
#[async_trait]
pub trait ProcessingLockStore: Send + Sync {
    /// Attempts to take the lock for `payment_id`.
    ///
    /// Returns `Ok(true)` if this caller now holds the lock, `Ok(false)` if
    /// another holder already does (a duplicate-key insert failure, not an
    /// error).
    async fn acquire(&self, payment_id: &str) -> Result<bool, DomainError>;

    /// Releases the lock for `payment_id`.
    ///
    /// A no-op when no lock row exists, so cleanup paths may call it
    /// unconditionally.
    async fn release(&self, payment_id: &str) -> Result<(), DomainError>;
}
