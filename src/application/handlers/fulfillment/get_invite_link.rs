//! Invite retrieval query handlers.
//!
//! Two read-only patterns for the client that just paid: a bounded poll that
//! waits out the background fulfillment, and a single-shot read that surfaces
//! the current payment status so the client can distinguish "not yet
//! processed", "failed", and "still processing".

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::DomainError;
use crate::domain::fulfillment::PaymentStatus;
use crate::ports::{BatchRepository, PaymentRepository, UserRepository};

/// A successfully retrieved invite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteLookup {
    pub invite_link: String,
    pub batch_name: String,
}

/// Polling behavior for [`GetInviteLinkHandler`].
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Number of read attempts before giving up.
    pub attempts: u32,

    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(2),
        }
    }
}

/// Bounded-polling invite lookup.
pub struct GetInviteLinkHandler {
    payments: Arc<dyn PaymentRepository>,
    users: Arc<dyn UserRepository>,
    batches: Arc<dyn BatchRepository>,
    poll: PollConfig,
}

impl GetInviteLinkHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        users: Arc<dyn UserRepository>,
        batches: Arc<dyn BatchRepository>,
        poll: PollConfig,
    ) -> Self {
        Self {
            payments,
            users,
            batches,
            poll,
        }
    }

    /// Re-reads the payment's invite until present or attempts run out.
    ///
    /// Returns `Ok(None)` after exhausting attempts; the caller maps that to
    /// a not-found response.
    pub async fn handle(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<InviteLookup>, DomainError> {
        for attempt in 0..self.poll.attempts {
            if attempt > 0 {
                tokio::time::sleep(self.poll.delay).await;
            }
            if let Some(found) = self.lookup(provider_payment_id).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    async fn lookup(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<InviteLookup>, DomainError> {
        let Some(payment) = self.payments.find_by_provider_id(provider_payment_id).await? else {
            return Ok(None);
        };
        let Some(user) = self.users.find_by_id(&payment.user_id).await? else {
            return Ok(None);
        };
        let Some(invite_link) = user.invite_link else {
            return Ok(None);
        };
        let batch_name = self
            .batches
            .find_by_id(&user.batch_id)
            .await?
            .map(|b| b.name)
            .unwrap_or_default();

        Ok(Some(InviteLookup {
            invite_link,
            batch_name,
        }))
    }
}

/// Current persisted state of an invite lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteLookupState {
    /// An invite link is available.
    Ready {
        invite_link: String,
        batch_name: String,
        status: PaymentStatus,
    },

    /// The payment exists but no invite link is available yet.
    Pending { status: PaymentStatus },

    /// No payment row exists for this id.
    NotFound,
}

impl InviteLookupState {
    /// Coarse status string surfaced to the client.
    pub fn status_str(&self) -> &'static str {
        match self {
            InviteLookupState::Ready { status, .. } => status.as_str(),
            InviteLookupState::Pending { status } => status.as_str(),
            InviteLookupState::NotFound => "not_found",
        }
    }
}

/// Single-shot invite lookup: returns whatever is currently persisted.
pub struct RetrieveInviteLinkHandler {
    payments: Arc<dyn PaymentRepository>,
    users: Arc<dyn UserRepository>,
    batches: Arc<dyn BatchRepository>,
}

impl RetrieveInviteLinkHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        users: Arc<dyn UserRepository>,
        batches: Arc<dyn BatchRepository>,
    ) -> Self {
        Self {
            payments,
            users,
            batches,
        }
    }

    pub async fn handle(
        &self,
        provider_payment_id: &str,
    ) -> Result<InviteLookupState, DomainError> {
        let Some(payment) = self.payments.find_by_provider_id(provider_payment_id).await? else {
            return Ok(InviteLookupState::NotFound);
        };

        let user = self.users.find_by_id(&payment.user_id).await?;
        let invite_link = user.as_ref().and_then(|u| u.invite_link.clone());

        match (user, invite_link) {
            (Some(user), Some(invite_link)) => {
                let batch_name = self
                    .batches
                    .find_by_id(&user.batch_id)
                    .await?
                    .map(|b| b.name)
                    .unwrap_or_default();
                Ok(InviteLookupState::Ready {
                    invite_link,
                    batch_name,
                    status: payment.status,
                })
            }
            _ => Ok(InviteLookupState::Pending {
                status: payment.status,
            }),
        }
    }
}
