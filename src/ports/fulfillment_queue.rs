//! Fulfillment queue port.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::UserId;
use crate::domain::fulfillment::FulfillmentSettings;

/// One scheduled unit of fulfillment work.
///
/// Carries everything the orchestrator needs, including the settings
/// snapshot resolved when the webhook was handled, so the unit of work never
/// reads ambient state and its lifetime is independent of the HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentJob {
    /// Provider payment id; also the lock key the job must release.
    pub provider_payment_id: String,

    /// The user being fulfilled.
    pub user_id: UserId,

    /// Batch (cohort) name for the email content.
    pub batch_name: String,

    /// Destination email address.
    pub email: String,

    /// Short id correlating this job's logs with the webhook delivery that
    /// scheduled it.
    pub request_id: String,

    /// Sender settings snapshot for the notification.
    pub settings: FulfillmentSettings,
}

/// Errors from scheduling a fulfillment job.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnqueueError {
    /// The bounded queue is at capacity.
    #[error("fulfillment queue is full")]
    Full,

    /// The worker has shut down and no longer accepts jobs.
    #[error("fulfillment queue is closed")]
    Closed,
}

/// Port for scheduling fulfillment work decoupled from the request cycle.
///
/// `enqueue` is synchronous and local: the webhook response must never wait
/// on external I/O, and handing a job to an in-process queue is not I/O.
pub trait FulfillmentQueue: Send + Sync {
    /// Schedules a job for background execution.
    fn enqueue(&self, job: FulfillmentJob) -> Result<(), EnqueueError>;
}
