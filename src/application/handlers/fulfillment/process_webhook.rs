//! ProcessWebhookHandler - Command handler for inbound payment webhooks.
//!
//! Runs the request-side half of the fulfillment pipeline: verify the
//! delivery, serialize concurrent attempts through the processing lock,
//! persist intent, and hand the actual work to the background queue. The
//! HTTP response never waits on a network call to the invite or email
//! providers.
//!
//! Lock discipline: after a successful `acquire`, every path out of this
//! handler either releases the lock (no-op acknowledgments, errors) or hands
//! it to the scheduled job, which releases it as its own final step. A
//! dangling `processing` row with no scheduled job and no lock would be
//! unrecoverable without a retry, so the lock is the safety net: if the
//! provider retries, a fresh acquire succeeds and reprocessing occurs.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::fulfillment::{
    FulfillmentError, FulfillmentSettings, Payment, PaymentEntity, PaymentStatus,
    ProviderEventType, WebhookEnvelope, WebhookSignatureVerifier,
};
use crate::ports::{
    BatchRepository, FulfillmentJob, FulfillmentQueue, PaymentRepository, ProcessingLockStore,
    UserRepository,
};

/// Command to process one webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body, exactly as received.
    pub raw_body: Vec<u8>,

    /// Claimed signature from the provider's signature header.
    pub signature: Option<String>,
}

/// Result of webhook processing.
///
/// Duplicate deliveries and unknown users are acknowledgments, not errors:
/// the provider retries on anything else, and a retry is exactly what those
/// paths must not trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Fulfillment was scheduled; the lock travels with the job.
    Scheduled,

    /// Event was not a payment capture (or carried no parseable body);
    /// acknowledged without side effects.
    Ignored,

    /// Another delivery for this payment id is in flight.
    AlreadyProcessing,

    /// The payment was already fulfilled by a prior run.
    AlreadyCompleted,

    /// No user exists for the email in the payload; a data problem upstream,
    /// not a transient one, so no retry is desired.
    UserNotFound,
}

impl WebhookOutcome {
    /// Acknowledgment message for the provider-facing response, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            WebhookOutcome::Scheduled | WebhookOutcome::Ignored => None,
            WebhookOutcome::AlreadyProcessing => Some("Already processing."),
            WebhookOutcome::AlreadyCompleted => Some("Payment already completed."),
            WebhookOutcome::UserNotFound => Some("User not found."),
        }
    }
}

/// Handler for inbound payment provider webhooks.
pub struct ProcessWebhookHandler {
    verifier: WebhookSignatureVerifier,
    payments: Arc<dyn PaymentRepository>,
    users: Arc<dyn UserRepository>,
    batches: Arc<dyn BatchRepository>,
    locks: Arc<dyn ProcessingLockStore>,
    queue: Arc<dyn FulfillmentQueue>,
    settings: FulfillmentSettings,
}

impl ProcessWebhookHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        verifier: WebhookSignatureVerifier,
        payments: Arc<dyn PaymentRepository>,
        users: Arc<dyn UserRepository>,
        batches: Arc<dyn BatchRepository>,
        locks: Arc<dyn ProcessingLockStore>,
        queue: Arc<dyn FulfillmentQueue>,
        settings: FulfillmentSettings,
    ) -> Self {
        Self {
            verifier,
            payments,
            users,
            batches,
            locks,
            queue,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<WebhookOutcome, FulfillmentError> {
        let request_id = short_request_id();

        // 1. Verify the signature over the raw bytes before any parsing.
        let signature = cmd.signature.as_deref().unwrap_or("");
        if !self.verifier.verify(&cmd.raw_body, signature) {
            tracing::warn!(request_id = %request_id, "webhook rejected: invalid signature");
            return Err(FulfillmentError::InvalidSignature);
        }

        // 2. Only payment captures proceed. A signed body that does not
        // decode cannot name a payment; acknowledge so the provider stops
        // retrying a delivery we will never be able to use.
        let envelope: WebhookEnvelope = match serde_json::from_slice(&cmd.raw_body) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(
                    request_id = %request_id,
                    error = %err,
                    "webhook body did not decode; acknowledging without action"
                );
                return Ok(WebhookOutcome::Ignored);
            }
        };
        if envelope.event_type() != ProviderEventType::PaymentCaptured {
            tracing::debug!(
                request_id = %request_id,
                event = %envelope.event,
                "ignoring non-capture event"
            );
            return Ok(WebhookOutcome::Ignored);
        }
        let entity = envelope.payment_entity().cloned().ok_or_else(|| {
            FulfillmentError::MalformedPayload(
                "payment.captured event without a payment entity".to_string(),
            )
        })?;

        // 3. First duplicate-delivery defense: the processing lock.
        if !self.locks.acquire(&entity.id).await? {
            tracing::info!(
                request_id = %request_id,
                payment_id = %entity.id,
                "lock already held; acknowledging duplicate delivery"
            );
            return Ok(WebhookOutcome::AlreadyProcessing);
        }

        // Steps 4-7 run under the lock; any failure must release it before
        // surfacing so a webhook retry can re-acquire and reprocess.
        match self.schedule_locked(&entity, &request_id).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                tracing::error!(
                    request_id = %request_id,
                    payment_id = %entity.id,
                    error = %err,
                    "error after lock acquisition; releasing lock"
                );
                if let Err(release_err) = self.locks.release(&entity.id).await {
                    tracing::error!(
                        request_id = %request_id,
                        payment_id = %entity.id,
                        error = %release_err,
                        "failed to release processing lock; manual clear required"
                    );
                }
                Err(err)
            }
        }
    }

    /// Steps 4-7 of the pipeline, entered holding the lock.
    ///
    /// Releases the lock itself on no-op acknowledgments; on `Scheduled` the
    /// lock is deliberately left held for the job to release.
    async fn schedule_locked(
        &self,
        entity: &PaymentEntity,
        request_id: &str,
    ) -> Result<WebhookOutcome, FulfillmentError> {
        let payment_id = &entity.id;

        // 4. Second duplicate-delivery defense: a prior run may have
        // completed and released its lock before this duplicate arrived.
        let existing = self.payments.find_by_provider_id(payment_id).await?;
        if existing
            .as_ref()
            .is_some_and(|p| p.status == PaymentStatus::Completed)
        {
            tracing::info!(
                request_id = %request_id,
                payment_id = %payment_id,
                "payment already completed; acknowledging duplicate delivery"
            );
            self.locks.release(payment_id).await?;
            return Ok(WebhookOutcome::AlreadyCompleted);
        }

        // 5. Resolve the user by the email in the payload.
        let Some(user) = self.users.find_by_email(&entity.email).await? else {
            tracing::warn!(
                request_id = %request_id,
                payment_id = %payment_id,
                email = %entity.email,
                "no user for webhook email; acknowledging for operator follow-up"
            );
            self.locks.release(payment_id).await?;
            return Ok(WebhookOutcome::UserNotFound);
        };

        let batch = self
            .batches
            .find_by_id(&user.batch_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::BatchNotFound,
                    format!("user {} references a missing batch", user.id),
                )
            })?;

        // 6. Create or update the payment row to processing.
        match existing {
            None => {
                let payment = Payment::record(
                    user.id,
                    payment_id,
                    &entity.order_id,
                    entity.amount,
                    &entity.currency,
                );
                self.payments.create(&payment).await?;
            }
            Some(_) => self.payments.mark_processing(payment_id).await?,
        }

        // 7. Schedule the orchestrator and return without waiting on it.
        let job = FulfillmentJob {
            provider_payment_id: payment_id.clone(),
            user_id: user.id,
            batch_name: batch.name,
            email: user.email.clone(),
            request_id: request_id.to_string(),
            settings: self.settings.clone(),
        };
        self.queue
            .enqueue(job)
            .map_err(|err| FulfillmentError::QueueUnavailable(err.to_string()))?;

        tracing::info!(
            request_id = %request_id,
            payment_id = %payment_id,
            "fulfillment scheduled"
        );
        Ok(WebhookOutcome::Scheduled)
    }
}

/// Short id tying a webhook delivery's log lines to its scheduled job.
fn short_request_id() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}
