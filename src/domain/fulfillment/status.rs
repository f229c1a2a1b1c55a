//! Payment status state machine.
//!
//! A payment row may not exist yet (the implicit pre-state); once recorded it
//! moves between three states. `Completed` is terminal: nothing ever leaves
//! it. The only backward edge is `Failed -> Processing`, which is how a later
//! webhook retry re-enters processing after a transient fulfillment failure.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a recorded payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// A webhook reported the payment and fulfillment is in flight
    /// (or stranded awaiting manual reconciliation).
    Processing,

    /// The fulfillment email was confirmed sent. Terminal.
    Completed,

    /// Fulfillment failed before any email was transmitted.
    /// Eligible for reprocessing on the next webhook delivery.
    Failed,
}

impl PaymentStatus {
    /// Returns true if the transition from `self` to `target` is allowed.
    pub fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            // Webhook retry re-enters processing after a failed attempt.
            (Failed, Processing)
            // Re-marking an in-flight payment is a no-op transition the
            // webhook handler performs when a duplicate slips past the lock
            // window after a failure.
                | (Processing, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }

    /// Returns true if no further transition out of this status is allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed)
    }

    /// Canonical storage string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
