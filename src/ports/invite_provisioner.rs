//! Invite provisioner port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::fulfillment::{Batch, User};

/// A single-use invite credential for a batch's messaging group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteLink {
    /// The invite URL to deliver to the customer.
    pub url: String,

    /// True when this call issued a fresh invite (the caller should persist
    /// it on the user); false when an existing invite was reused.
    pub newly_issued: bool,
}

impl InviteLink {
    /// An invite reused from the user's record.
    pub fn reused(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            newly_issued: false,
        }
    }

    /// A freshly issued invite.
    pub fn issued(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            newly_issued: true,
        }
    }
}

/// Errors from invite provisioning.
///
/// Any error is non-retryable within the call; the orchestrator decides
/// whether to mark the payment failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvisionError {
    /// The invite API answered with a non-ok envelope.
    #[error("invite API rejected the request: {0}")]
    Api(String),

    /// The invite API could not be reached.
    #[error("invite API transport error: {0}")]
    Transport(String),

    /// The provisioner is missing required configuration.
    #[error("invite provisioner not configured: {0}")]
    NotConfigured(&'static str),
}

/// Port for idempotent invite provisioning.
#[async_trait]
pub trait InviteProvisioner: Send + Sync {
    /// Returns an invite for `user` into `batch`'s group.
    ///
    /// Idempotent from the caller's perspective: if the user already holds a
    /// valid invite for the given batch it is returned unchanged rather than
    /// re-requested, since issuing a fresh one-time invite would invalidate
    /// a previously emailed link the user may not have used yet.
    async fn ensure_invite(&self, user: &User, batch: &Batch) -> Result<InviteLink, ProvisionError>;
}
