//! User entity.
//!
//! Users are created or looked up by email at checkout time by the
//! order-creation flow (an external collaborator of this service). The
//! fulfillment pipeline reads them and conditionally records a provisioned
//! invite link.

use crate::domain::foundation::{BatchId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use super::Batch;

/// A customer enrolled in a course batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,

    /// The batch (cohort) the user is enrolled in.
    pub batch_id: BatchId,

    /// Invite link previously issued for the user's batch, if any.
    ///
    /// Once issued it is reused for subsequent payments by the same user for
    /// the same batch rather than re-requested: a fresh one-time invite
    /// would invalidate a previously emailed link the user may not have used
    /// yet. Changing batch invalidates reuse.
    pub invite_link: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Returns the stored invite link if it may be reused for `batch`.
    pub fn reusable_invite_for(&self, batch: &Batch) -> Option<&str> {
        if self.batch_id == batch.id {
            self.invite_link.as_deref()
        } else {
            None
        }
    }
}
