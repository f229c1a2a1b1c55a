//! FulfillmentWorker - background consumer of scheduled fulfillment jobs.
//!
//! The webhook handler enqueues onto a bounded channel and returns; this
//! worker drains the channel and runs one orchestrator task per job. Jobs
//! for different payment ids run fully in parallel; the lock store is what
//! serializes attempts for the same id, so the worker itself needs no
//! per-key bookkeeping.
//!
//! ## Graceful Shutdown
//!
//! The worker listens on a watch channel. On shutdown it stops accepting,
//! schedules whatever is already queued, and waits for all in-flight runs to
//! finish, so no acquired lock is abandoned by a clean process exit.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::ports::FulfillmentJob;

use super::handlers::fulfillment::FulfillPaymentHandler;

/// Background service draining the fulfillment queue.
pub struct FulfillmentWorker {
    handler: Arc<FulfillPaymentHandler>,
    jobs: mpsc::Receiver<FulfillmentJob>,
}

impl FulfillmentWorker {
    pub fn new(handler: Arc<FulfillPaymentHandler>, jobs: mpsc::Receiver<FulfillmentJob>) -> Self {
        Self { handler, jobs }
    }

    /// Runs the worker loop until the shutdown signal flips to true.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }

                // Reap finished runs so the set does not grow unbounded.
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}

                job = self.jobs.recv() => match job {
                    Some(job) => self.spawn(&mut in_flight, job),
                    // All senders dropped; nothing further can arrive.
                    None => break,
                },
            }
        }

        // Drain: schedule already-queued jobs, then wait out every run.
        self.jobs.close();
        while let Some(job) = self.jobs.recv().await {
            self.spawn(&mut in_flight, job);
        }
        while in_flight.join_next().await.is_some() {}

        tracing::info!("fulfillment worker stopped");
    }

    fn spawn(&self, in_flight: &mut JoinSet<()>, job: FulfillmentJob) {
        let handler = self.handler.clone();
        in_flight.spawn(async move {
            handler.handle(job).await;
        });
    }
}
