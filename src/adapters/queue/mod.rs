//! In-process bounded queue adapter for the fulfillment queue port.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::ports::{EnqueueError, FulfillmentJob, FulfillmentQueue};

/// Bounded mpsc implementation of the FulfillmentQueue port.
///
/// The sending half lives in the webhook handler's state; the receiving half
/// is consumed by the FulfillmentWorker. Capacity bounds how many scheduled
/// jobs may be outstanding; beyond that the webhook path reports an internal
/// error and relies on the provider's retry.
#[derive(Clone)]
pub struct ChannelFulfillmentQueue {
    sender: mpsc::Sender<FulfillmentJob>,
}

impl ChannelFulfillmentQueue {
    /// Wraps an existing sender.
    pub fn new(sender: mpsc::Sender<FulfillmentJob>) -> Self {
        Self { sender }
    }

    /// Creates a bounded queue, returning the adapter and the worker's
    /// receiving half.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<FulfillmentJob>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

impl FulfillmentQueue for ChannelFulfillmentQueue {
    fn enqueue(&self, job: FulfillmentJob) -> Result<(), EnqueueError> {
        self.sender.try_send(job).map_err(|err| match err {
            TrySendError::Full(_) => EnqueueError::Full,
            TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::fulfillment::FulfillmentSettings;

    fn test_job(payment_id: &str) -> FulfillmentJob {
        FulfillmentJob {
            provider_payment_id: payment_id.to_string(),
            user_id: UserId::new(),
            batch_name: "morning".to_string(),
            email: "a@x.com".to_string(),
            request_id: "abc123".to_string(),
            settings: FulfillmentSettings::new("CourseGate", "noreply@coursegate.in"),
        }
    }

    #[tokio::test]
    async fn enqueued_jobs_arrive_in_order() {
        let (queue, mut receiver) = ChannelFulfillmentQueue::bounded(4);
        queue.enqueue(test_job("pay_1")).unwrap();
        queue.enqueue(test_job("pay_2")).unwrap();

        assert_eq!(receiver.recv().await.unwrap().provider_payment_id, "pay_1");
        assert_eq!(receiver.recv().await.unwrap().provider_payment_id, "pay_2");
    }

    #[tokio::test]
    async fn full_queue_reports_full() {
        let (queue, _receiver) = ChannelFulfillmentQueue::bounded(1);
        queue.enqueue(test_job("pay_1")).unwrap();

        assert_eq!(queue.enqueue(test_job("pay_2")), Err(EnqueueError::Full));
    }

    #[tokio::test]
    async fn dropped_receiver_reports_closed() {
        let (queue, receiver) = ChannelFulfillmentQueue::bounded(1);
        drop(receiver);

        assert_eq!(queue.enqueue(test_job("pay_1")), Err(EnqueueError::Closed));
    }
}
