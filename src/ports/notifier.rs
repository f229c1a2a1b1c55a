//! Fulfillment notifier port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::fulfillment::FulfillmentSettings;

/// Everything needed to compose and address one fulfillment email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentEmail {
    /// Destination address.
    pub to: String,

    /// Customer display name.
    pub user_name: String,

    /// Batch (cohort) name, shown in the subject and body.
    pub batch_name: String,

    /// The single-use invite link being delivered.
    pub invite_link: String,

    /// Provider payment id, included for the customer's reference.
    pub provider_payment_id: String,
}

/// Errors from the email transport.
///
/// The split matters to the orchestrator: a rejected message was definitely
/// never transmitted and the payment may be marked failed for retry; an
/// ambiguous outcome may have reached the customer, so the payment must be
/// left in processing rather than retried into a duplicate send.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// The transport refused the message before accepting it.
    #[error("email rejected by transport: {0}")]
    Rejected(String),

    /// Delivery outcome unknown (timeout, connection dropped mid-session).
    #[error("email delivery outcome unknown: {0}")]
    Ambiguous(String),

    /// The notifier is missing required configuration.
    #[error("email transport not configured: {0}")]
    NotConfigured(&'static str),
}

/// Port for sending the fulfillment email.
#[async_trait]
pub trait FulfillmentNotifier: Send + Sync {
    /// Sends one fulfillment email using the given sender settings.
    async fn send(
        &self,
        email: &FulfillmentEmail,
        settings: &FulfillmentSettings,
    ) -> Result<(), NotifyError>;
}
