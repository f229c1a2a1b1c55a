//! Payment record entity.
//!
//! One row per provider payment id (unique constraint enforced at the
//! database level). Created when a webhook first reports the payment and
//! mutated only by the webhook handler and the fulfillment orchestrator
//! while they hold the processing lock. Never deleted: the table is the
//! audit trail.
//!
//! # Invariants
//!
//! - `email_sent == true` implies `status == Completed`; the two are always
//!   written together in a single update.
//! - Amounts are provider minor units as i64, never floats.

use crate::domain::foundation::{DomainError, ErrorCode, PaymentRecordId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use super::PaymentStatus;

/// A recorded payment attempt and its fulfillment lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Internal row id.
    pub id: PaymentRecordId,

    /// The user this payment belongs to.
    pub user_id: UserId,

    /// Provider-assigned payment id (unique, stable).
    pub provider_payment_id: String,

    /// Provider-assigned order id.
    pub provider_order_id: String,

    /// Amount in the provider's minor currency unit.
    pub amount_minor: i64,

    /// ISO currency code.
    pub currency: String,

    /// Lifecycle status.
    pub status: PaymentStatus,

    /// Whether the fulfillment email was confirmed sent.
    pub email_sent: bool,

    /// Snapshot of the invite link that was actually emailed.
    pub invite_link: Option<String>,

    /// When the payment was first recorded.
    pub created_at: Timestamp,

    /// When the record was last updated.
    pub updated_at: Timestamp,
}

impl Payment {
    /// Records a payment freshly reported by a webhook, in `Processing`.
    pub fn record(
        user_id: UserId,
        provider_payment_id: impl Into<String>,
        provider_order_id: impl Into<String>,
        amount_minor: i64,
        currency: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: PaymentRecordId::new(),
            user_id,
            provider_payment_id: provider_payment_id.into(),
            provider_order_id: provider_order_id.into(),
            amount_minor,
            currency: currency.into(),
            status: PaymentStatus::Processing,
            email_sent: false,
            invite_link: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Re-enters `Processing` for a retry after a failed attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is already completed.
    pub fn begin_reprocessing(&mut self) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Processing)
    }

    /// Marks the payment completed with the emailed invite, atomically with
    /// the email-sent flag.
    ///
    /// # Errors
    ///
    /// Returns an error unless the payment is currently processing.
    pub fn complete(&mut self, invite_link: impl Into<String>) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Completed)?;
        self.email_sent = true;
        self.invite_link = Some(invite_link.into());
        Ok(())
    }

    /// Marks the payment failed, enabling a retry via a future webhook.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is already completed.
    pub fn fail(&mut self) -> Result<(), DomainError> {
        self.transition_to(PaymentStatus::Failed)
    }

    fn transition_to(&mut self, target: PaymentStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(&target) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("payment cannot move from {} to {}", self.status, target),
            )
            .with_detail("provider_payment_id", self.provider_payment_id.clone()));
        }
        self.status = target;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
