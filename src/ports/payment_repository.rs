//! Payment repository port.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::fulfillment::Payment;

/// Port for persistent payment records.
///
/// Every mutation is its own atomic commit and is never held open across an
/// external network call. Status and the email-sent flag are only ever set
/// together (`mark_completed`), so readers can never observe
/// `email_sent = true` with a non-completed status.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Inserts a freshly recorded payment.
    ///
    /// Callers hold the processing lock, so a unique-constraint failure here
    /// indicates a bug rather than a race to tolerate; it surfaces as a
    /// `DatabaseError`.
    async fn create(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Looks up a payment by the provider-assigned payment id.
    async fn find_by_provider_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Moves an existing payment (back) into `processing`.
    async fn mark_processing(&self, provider_payment_id: &str) -> Result<(), DomainError>;

    /// Moves a payment into `failed`, enabling a webhook-retry reprocess.
    async fn mark_failed(&self, provider_payment_id: &str) -> Result<(), DomainError>;

    /// Atomically sets status `completed`, `email_sent = true`, and the
    /// invite snapshot in a single update.
    async fn mark_completed(
        &self,
        provider_payment_id: &str,
        invite_link: &str,
    ) -> Result<(), DomainError>;
}
