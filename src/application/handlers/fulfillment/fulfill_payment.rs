//! FulfillPaymentHandler - the background fulfillment orchestrator.
//!
//! Executes one scheduled unit of work: provision an invite, email it, and
//! mark the payment completed, with defense-in-depth against the races a
//! webhook-retrying provider creates. Runs with its own repository calls,
//! independent of the HTTP request that scheduled it.
//!
//! The failure split is deliberate and asymmetric:
//!
//! - Anything that fails before a possible transmission marks the payment
//!   `failed`, which re-arms processing for the next webhook delivery.
//! - Once transmission is possible-or-confirmed, the payment is never
//!   downgraded to `failed`: a retry would re-send, and one duplicate email
//!   is worse than one manual reconciliation. Those payments stay
//!   `processing` and are surfaced by logs.
//!
//! Releasing the processing lock is the one step that runs on every exit
//! path.

use std::sync::Arc;

use crate::domain::fulfillment::PaymentStatus;
use crate::ports::{
    BatchRepository, FulfillmentEmail, FulfillmentJob, FulfillmentNotifier, InviteProvisioner,
    NotifyError, PaymentRepository, ProcessingLockStore, UserRepository,
};

/// Terminal outcome of one orchestrator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    /// Invite delivered; payment atomically marked completed + email_sent.
    Completed,

    /// Another run already delivered the email; nothing to do.
    AlreadyFulfilled,

    /// Payment or user row is missing; nothing to do.
    RecordMissing,

    /// Provisioning or a pre-send step failed; payment marked failed for
    /// reprocessing on the next webhook delivery.
    MarkedFailed,

    /// The notifier's outcome is unknown; the email may have reached the
    /// customer, so the payment stays processing for manual reconciliation.
    SendAmbiguous,

    /// The email was transmitted but the completion write failed; the
    /// payment stays processing so a retry cannot re-send.
    CompletionUnrecorded,

    /// An infrastructure error stopped the run before any send; the payment
    /// is left as it was.
    Aborted,
}

/// Orchestrator for scheduled fulfillment jobs.
pub struct FulfillPaymentHandler {
    payments: Arc<dyn PaymentRepository>,
    users: Arc<dyn UserRepository>,
    batches: Arc<dyn BatchRepository>,
    locks: Arc<dyn ProcessingLockStore>,
    provisioner: Arc<dyn InviteProvisioner>,
    notifier: Arc<dyn FulfillmentNotifier>,
}

impl FulfillPaymentHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        users: Arc<dyn UserRepository>,
        batches: Arc<dyn BatchRepository>,
        locks: Arc<dyn ProcessingLockStore>,
        provisioner: Arc<dyn InviteProvisioner>,
        notifier: Arc<dyn FulfillmentNotifier>,
    ) -> Self {
        Self {
            payments,
            users,
            batches,
            locks,
            provisioner,
            notifier,
        }
    }

    /// Runs the job to completion and unconditionally releases its lock.
    pub async fn handle(&self, job: FulfillmentJob) -> FulfillmentOutcome {
        let outcome = self.fulfill(&job).await;

        if let Err(err) = self.locks.release(&job.provider_payment_id).await {
            tracing::error!(
                request_id = %job.request_id,
                payment_id = %job.provider_payment_id,
                error = %err,
                "failed to release processing lock; manual clear required"
            );
        }

        tracing::info!(
            request_id = %job.request_id,
            payment_id = %job.provider_payment_id,
            outcome = ?outcome,
            "fulfillment run finished"
        );
        outcome
    }

    async fn fulfill(&self, job: &FulfillmentJob) -> FulfillmentOutcome {
        let payment_id = &job.provider_payment_id;

        // 1. Immediate short-circuit: two scheduled runs may have briefly
        // overlapped; if one already delivered, stop before any other work.
        match self.payments.find_by_provider_id(payment_id).await {
            Ok(Some(p)) if p.email_sent => return FulfillmentOutcome::AlreadyFulfilled,
            Ok(_) => {}
            Err(err) => {
                tracing::error!(
                    request_id = %job.request_id,
                    payment_id = %payment_id,
                    error = %err,
                    "could not read payment; aborting run"
                );
                return FulfillmentOutcome::Aborted;
            }
        }

        // 2. Main fetch of the records this run operates on.
        let payment = match self.payments.find_by_provider_id(payment_id).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                tracing::warn!(
                    request_id = %job.request_id,
                    payment_id = %payment_id,
                    "payment row disappeared; aborting run"
                );
                return FulfillmentOutcome::RecordMissing;
            }
            Err(_) => return FulfillmentOutcome::Aborted,
        };
        let user = match self.users.find_by_id(&job.user_id).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                tracing::warn!(
                    request_id = %job.request_id,
                    payment_id = %payment_id,
                    user_id = %job.user_id,
                    "user row disappeared; aborting run"
                );
                return FulfillmentOutcome::RecordMissing;
            }
            Err(_) => return FulfillmentOutcome::Aborted,
        };

        // 3. Redundant but intentional: a race between scheduling and
        // execution may have completed this payment in the meantime.
        if payment.email_sent || payment.status == PaymentStatus::Completed {
            return FulfillmentOutcome::AlreadyFulfilled;
        }

        // 4. Ensure an invite exists. The provisioner reuses the user's
        // stored link for this batch and issues a fresh single-use invite
        // otherwise; a newly issued link is persisted before sending so a
        // crash between send and persist cannot lose it.
        let batch = match self.batches.find_by_id(&user.batch_id).await {
            Ok(Some(b)) => b,
            Ok(None) => {
                tracing::error!(
                    request_id = %job.request_id,
                    payment_id = %payment_id,
                    batch_id = %user.batch_id,
                    "user references a missing batch"
                );
                return self.mark_failed(job).await;
            }
            Err(_) => return FulfillmentOutcome::Aborted,
        };
        let invite = match self.provisioner.ensure_invite(&user, &batch).await {
            Ok(invite) => invite,
            Err(err) => {
                tracing::warn!(
                    request_id = %job.request_id,
                    payment_id = %payment_id,
                    error = %err,
                    "invite provisioning failed"
                );
                return self.mark_failed(job).await;
            }
        };
        if invite.newly_issued {
            if let Err(err) = self.users.set_invite_link(&user.id, &invite.url).await {
                tracing::error!(
                    request_id = %job.request_id,
                    payment_id = %payment_id,
                    error = %err,
                    "could not persist freshly issued invite"
                );
                return self.mark_failed(job).await;
            }
        }

        // 5. Re-check right before transmission to minimize the window
        // between check and send.
        match self.payments.find_by_provider_id(payment_id).await {
            Ok(Some(p)) if p.email_sent => return FulfillmentOutcome::AlreadyFulfilled,
            Ok(Some(_)) => {}
            Ok(None) => return FulfillmentOutcome::RecordMissing,
            Err(_) => return FulfillmentOutcome::Aborted,
        }

        // 6. Transmit.
        let email = FulfillmentEmail {
            to: user.email.clone(),
            user_name: user.name.clone(),
            batch_name: job.batch_name.clone(),
            invite_link: invite.url.clone(),
            provider_payment_id: payment_id.clone(),
        };
        match self.notifier.send(&email, &job.settings).await {
            Ok(()) => {}
            Err(NotifyError::Rejected(reason)) => {
                tracing::warn!(
                    request_id = %job.request_id,
                    payment_id = %payment_id,
                    reason = %reason,
                    "email rejected before transmission"
                );
                return self.mark_failed(job).await;
            }
            Err(NotifyError::NotConfigured(what)) => {
                tracing::warn!(
                    request_id = %job.request_id,
                    payment_id = %payment_id,
                    missing = %what,
                    "email transport not configured"
                );
                return self.mark_failed(job).await;
            }
            Err(NotifyError::Ambiguous(reason)) => {
                // The message may have reached the customer. Never mark
                // failed here: a retry would risk a duplicate send.
                tracing::error!(
                    request_id = %job.request_id,
                    payment_id = %payment_id,
                    reason = %reason,
                    "email outcome unknown; leaving payment processing for manual reconciliation"
                );
                return FulfillmentOutcome::SendAmbiguous;
            }
        }

        // 7. Atomically record completed + email_sent.
        if let Err(err) = self
            .payments
            .mark_completed(payment_id, &invite.url)
            .await
        {
            tracing::error!(
                request_id = %job.request_id,
                payment_id = %payment_id,
                error = %err,
                "email sent but completion write failed; leaving payment processing for manual reconciliation"
            );
            return FulfillmentOutcome::CompletionUnrecorded;
        }

        FulfillmentOutcome::Completed
    }

    /// Marks the payment failed so the next webhook delivery can retry.
    async fn mark_failed(&self, job: &FulfillmentJob) -> FulfillmentOutcome {
        match self.payments.mark_failed(&job.provider_payment_id).await {
            Ok(()) => FulfillmentOutcome::MarkedFailed,
            Err(err) => {
                tracing::error!(
                    request_id = %job.request_id,
                    payment_id = %job.provider_payment_id,
                    error = %err,
                    "could not mark payment failed"
                );
                FulfillmentOutcome::Aborted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{BatchId, DomainError, Timestamp, UserId};
    use crate::domain::fulfillment::{Batch, FulfillmentSettings, Payment, User};
    use crate::ports::{InviteLink, ProvisionError};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════

    struct MockPaymentRepository {
        payments: Mutex<Vec<Payment>>,
        fail_completion_write: bool,
    }

    impl MockPaymentRepository {
        fn with_payment(payment: Payment) -> Self {
            Self {
                payments: Mutex::new(vec![payment]),
                fail_completion_write: false,
            }
        }

        fn failing_completion(payment: Payment) -> Self {
            Self {
                payments: Mutex::new(vec![payment]),
                fail_completion_write: true,
            }
        }

        fn empty() -> Self {
            Self {
                payments: Mutex::new(Vec::new()),
                fail_completion_write: false,
            }
        }

        fn get(&self, provider_payment_id: &str) -> Option<Payment> {
            self.payments
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.provider_payment_id == provider_payment_id)
                .cloned()
        }
    }

    #[async_trait]
    impl PaymentRepository for MockPaymentRepository {
        async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
            self.payments.lock().unwrap().push(payment.clone());
            Ok(())
        }

        async fn find_by_provider_id(
            &self,
            provider_payment_id: &str,
        ) -> Result<Option<Payment>, DomainError> {
            Ok(self.get(provider_payment_id))
        }

        async fn mark_processing(&self, provider_payment_id: &str) -> Result<(), DomainError> {
            let mut payments = self.payments.lock().unwrap();
            if let Some(p) = payments
                .iter_mut()
                .find(|p| p.provider_payment_id == provider_payment_id)
            {
                p.begin_reprocessing()?;
            }
            Ok(())
        }

        async fn mark_failed(&self, provider_payment_id: &str) -> Result<(), DomainError> {
            let mut payments = self.payments.lock().unwrap();
            if let Some(p) = payments
                .iter_mut()
                .find(|p| p.provider_payment_id == provider_payment_id)
            {
                p.fail()?;
            }
            Ok(())
        }

        async fn mark_completed(
            &self,
            provider_payment_id: &str,
            invite_link: &str,
        ) -> Result<(), DomainError> {
            if self.fail_completion_write {
                return Err(DomainError::database("connection reset"));
            }
            let mut payments = self.payments.lock().unwrap();
            if let Some(p) = payments
                .iter_mut()
                .find(|p| p.provider_payment_id == provider_payment_id)
            {
                p.complete(invite_link)?;
            }
            Ok(())
        }
    }

    struct MockUserRepository {
        users: Mutex<Vec<User>>,
    }

    impl MockUserRepository {
        fn with_user(user: User) -> Self {
            Self {
                users: Mutex::new(vec![user]),
            }
        }

        fn empty() -> Self {
            Self {
                users: Mutex::new(Vec::new()),
            }
        }

        fn get(&self, id: &UserId) -> Option<User> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| &u.id == id)
                .cloned()
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
            Ok(self.get(id))
        }

        async fn set_invite_link(
            &self,
            id: &UserId,
            invite_link: &str,
        ) -> Result<(), DomainError> {
            let mut users = self.users.lock().unwrap();
            if let Some(u) = users.iter_mut().find(|u| &u.id == id) {
                u.invite_link = Some(invite_link.to_string());
            }
            Ok(())
        }
    }

    struct MockBatchRepository {
        batches: Mutex<Vec<Batch>>,
    }

    impl MockBatchRepository {
        fn with_batch(batch: Batch) -> Self {
            Self {
                batches: Mutex::new(vec![batch]),
            }
        }
    }

    #[async_trait]
    impl BatchRepository for MockBatchRepository {
        async fn find_by_id(&self, id: &BatchId) -> Result<Option<Batch>, DomainError> {
            Ok(self
                .batches
                .lock()
                .unwrap()
                .iter()
                .find(|b| &b.id == id)
                .cloned())
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<Batch>, DomainError> {
            Ok(self
                .batches
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.name == name)
                .cloned())
        }
    }

    struct MockLockStore {
        held: Mutex<HashSet<String>>,
    }

    impl MockLockStore {
        fn holding(payment_id: &str) -> Self {
            let held = Mutex::new(HashSet::new());
            held.lock().unwrap().insert(payment_id.to_string());
            Self { held }
        }

        fn is_held(&self, payment_id: &str) -> bool {
            self.held.lock().unwrap().contains(payment_id)
        }
    }

    #[async_trait]
    impl ProcessingLockStore for MockLockStore {
        async fn acquire(&self, payment_id: &str) -> Result<bool, DomainError> {
            Ok(self.held.lock().unwrap().insert(payment_id.to_string()))
        }

        async fn release(&self, payment_id: &str) -> Result<(), DomainError> {
            self.held.lock().unwrap().remove(payment_id);
            Ok(())
        }
    }

    /// Provisioner that follows the port contract: reuse the user's stored
    /// invite for the batch, otherwise issue a fresh one.
    struct MockProvisioner {
        fail: bool,
        issued: AtomicU32,
    }

    impl MockProvisioner {
        fn new() -> Self {
            Self {
                fail: false,
                issued: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                issued: AtomicU32::new(0),
            }
        }

        fn issued_count(&self) -> u32 {
            self.issued.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InviteProvisioner for MockProvisioner {
        async fn ensure_invite(
            &self,
            user: &User,
            batch: &Batch,
        ) -> Result<InviteLink, ProvisionError> {
            if self.fail {
                return Err(ProvisionError::Api("chat not found".to_string()));
            }
            if let Some(existing) = user.reusable_invite_for(batch) {
                return Ok(InviteLink::reused(existing));
            }
            let n = self.issued.fetch_add(1, Ordering::SeqCst);
            Ok(InviteLink::issued(format!("https://t.me/+fresh{}", n)))
        }
    }

    enum NotifierMode {
        Succeed,
        Reject,
        Ambiguous,
    }

    struct MockNotifier {
        mode: NotifierMode,
        sent: Mutex<Vec<FulfillmentEmail>>,
    }

    impl MockNotifier {
        fn new(mode: NotifierMode) -> Self {
            Self {
                mode,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<FulfillmentEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FulfillmentNotifier for MockNotifier {
        async fn send(
            &self,
            email: &FulfillmentEmail,
            _settings: &FulfillmentSettings,
        ) -> Result<(), NotifyError> {
            match self.mode {
                NotifierMode::Succeed => {
                    self.sent.lock().unwrap().push(email.clone());
                    Ok(())
                }
                NotifierMode::Reject => {
                    Err(NotifyError::Rejected("550 mailbox unavailable".to_string()))
                }
                NotifierMode::Ambiguous => {
                    // Simulates a transmit whose confirmation never arrived.
                    self.sent.lock().unwrap().push(email.clone());
                    Err(NotifyError::Ambiguous("connection reset after data".to_string()))
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════

    fn test_batch() -> Batch {
        Batch {
            id: BatchId::new(),
            name: "morning".to_string(),
            telegram_chat_id: "-1000000000001".to_string(),
            created_at: Timestamp::now(),
        }
    }

    fn test_user(batch_id: BatchId, invite_link: Option<&str>) -> User {
        let now = Timestamp::now();
        User {
            id: UserId::new(),
            name: "Asha".to_string(),
            email: "a@x.com".to_string(),
            phone: "9999999999".to_string(),
            batch_id,
            invite_link: invite_link.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn job_for(user: &User, payment_id: &str) -> FulfillmentJob {
        FulfillmentJob {
            provider_payment_id: payment_id.to_string(),
            user_id: user.id,
            batch_name: "morning".to_string(),
            email: user.email.clone(),
            request_id: "abc123".to_string(),
            settings: FulfillmentSettings::new("CourseGate", "noreply@coursegate.in"),
        }
    }

    struct Fixture {
        payments: Arc<MockPaymentRepository>,
        users: Arc<MockUserRepository>,
        locks: Arc<MockLockStore>,
        provisioner: Arc<MockProvisioner>,
        notifier: Arc<MockNotifier>,
        handler: FulfillPaymentHandler,
    }

    fn fixture(
        payments: MockPaymentRepository,
        users: MockUserRepository,
        batch: Batch,
        provisioner: MockProvisioner,
        notifier: MockNotifier,
        payment_id: &str,
    ) -> Fixture {
        let payments = Arc::new(payments);
        let users = Arc::new(users);
        let locks = Arc::new(MockLockStore::holding(payment_id));
        let provisioner = Arc::new(provisioner);
        let notifier = Arc::new(notifier);
        let handler = FulfillPaymentHandler::new(
            payments.clone(),
            users.clone(),
            Arc::new(MockBatchRepository::with_batch(batch)),
            locks.clone(),
            provisioner.clone(),
            notifier.clone(),
        );
        Fixture {
            payments,
            users,
            locks,
            provisioner,
            notifier,
            handler,
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Happy Path
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn completes_payment_and_sends_stored_invite_once() {
        let batch = test_batch();
        let user = test_user(batch.id, Some("https://t.me/+L"));
        let payment = Payment::record(user.id, "pay_123", "order_456", 499900, "INR");
        let job = job_for(&user, "pay_123");

        let f = fixture(
            MockPaymentRepository::with_payment(payment),
            MockUserRepository::with_user(user),
            batch,
            MockProvisioner::new(),
            MockNotifier::new(NotifierMode::Succeed),
            "pay_123",
        );

        let outcome = f.handler.handle(job).await;
        assert_eq!(outcome, FulfillmentOutcome::Completed);

        let payment = f.payments.get("pay_123").unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(payment.email_sent);
        assert_eq!(payment.invite_link.as_deref(), Some("https://t.me/+L"));

        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].invite_link, "https://t.me/+L");
        assert_eq!(sent[0].to, "a@x.com");

        // No fresh invite was issued for a user who already held one.
        assert_eq!(f.provisioner.issued_count(), 0);
        assert!(!f.locks.is_held("pay_123"));
    }

    #[tokio::test]
    async fn late_provisioning_issues_and_persists_link() {
        let batch = test_batch();
        let user = test_user(batch.id, None);
        let user_id = user.id;
        let payment = Payment::record(user.id, "pay_123", "order_456", 499900, "INR");
        let job = job_for(&user, "pay_123");

        let f = fixture(
            MockPaymentRepository::with_payment(payment),
            MockUserRepository::with_user(user),
            batch,
            MockProvisioner::new(),
            MockNotifier::new(NotifierMode::Succeed),
            "pay_123",
        );

        let outcome = f.handler.handle(job).await;
        assert_eq!(outcome, FulfillmentOutcome::Completed);
        assert_eq!(f.provisioner.issued_count(), 1);

        // The fresh link was persisted on the user and emailed.
        let stored = f.users.get(&user_id).unwrap().invite_link.unwrap();
        assert_eq!(f.notifier.sent()[0].invite_link, stored);
        assert!(!f.locks.is_held("pay_123"));
    }

    // ════════════════════════════════════════════════════════════════════════
    // Idempotency Short-Circuits
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn already_sent_payment_short_circuits() {
        let batch = test_batch();
        let user = test_user(batch.id, Some("https://t.me/+L"));
        let mut payment = Payment::record(user.id, "pay_123", "order_456", 499900, "INR");
        payment.complete("https://t.me/+L").unwrap();
        let job = job_for(&user, "pay_123");

        let f = fixture(
            MockPaymentRepository::with_payment(payment),
            MockUserRepository::with_user(user),
            batch,
            MockProvisioner::new(),
            MockNotifier::new(NotifierMode::Succeed),
            "pay_123",
        );

        let outcome = f.handler.handle(job).await;
        assert_eq!(outcome, FulfillmentOutcome::AlreadyFulfilled);
        assert!(f.notifier.sent().is_empty());
        assert!(!f.locks.is_held("pay_123"));
    }

    #[tokio::test]
    async fn missing_payment_aborts_and_releases_lock() {
        let batch = test_batch();
        let user = test_user(batch.id, Some("https://t.me/+L"));
        let job = job_for(&user, "pay_void");

        let f = fixture(
            MockPaymentRepository::empty(),
            MockUserRepository::with_user(user),
            batch,
            MockProvisioner::new(),
            MockNotifier::new(NotifierMode::Succeed),
            "pay_void",
        );

        let outcome = f.handler.handle(job).await;
        assert_eq!(outcome, FulfillmentOutcome::RecordMissing);
        assert!(f.notifier.sent().is_empty());
        assert!(!f.locks.is_held("pay_void"));
    }

    #[tokio::test]
    async fn missing_user_aborts_and_releases_lock() {
        let batch = test_batch();
        let user = test_user(batch.id, Some("https://t.me/+L"));
        let payment = Payment::record(user.id, "pay_123", "order_456", 499900, "INR");
        let job = job_for(&user, "pay_123");

        let f = fixture(
            MockPaymentRepository::with_payment(payment),
            MockUserRepository::empty(),
            batch,
            MockProvisioner::new(),
            MockNotifier::new(NotifierMode::Succeed),
            "pay_123",
        );

        let outcome = f.handler.handle(job).await;
        assert_eq!(outcome, FulfillmentOutcome::RecordMissing);
        assert!(!f.locks.is_held("pay_123"));
    }

    // ════════════════════════════════════════════════════════════════════════
    // Failure Branches
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn provisioning_failure_marks_failed() {
        let batch = test_batch();
        let user = test_user(batch.id, None);
        let payment = Payment::record(user.id, "pay_123", "order_456", 499900, "INR");
        let job = job_for(&user, "pay_123");

        let f = fixture(
            MockPaymentRepository::with_payment(payment),
            MockUserRepository::with_user(user),
            batch,
            MockProvisioner::failing(),
            MockNotifier::new(NotifierMode::Succeed),
            "pay_123",
        );

        let outcome = f.handler.handle(job).await;
        assert_eq!(outcome, FulfillmentOutcome::MarkedFailed);

        let payment = f.payments.get("pay_123").unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert!(!payment.email_sent);
        assert!(f.notifier.sent().is_empty());
        assert!(!f.locks.is_held("pay_123"));
    }

    #[tokio::test]
    async fn rejected_send_marks_failed_for_retry() {
        let batch = test_batch();
        let user = test_user(batch.id, Some("https://t.me/+L"));
        let payment = Payment::record(user.id, "pay_123", "order_456", 499900, "INR");
        let job = job_for(&user, "pay_123");

        let f = fixture(
            MockPaymentRepository::with_payment(payment),
            MockUserRepository::with_user(user),
            batch,
            MockProvisioner::new(),
            MockNotifier::new(NotifierMode::Reject),
            "pay_123",
        );

        let outcome = f.handler.handle(job).await;
        assert_eq!(outcome, FulfillmentOutcome::MarkedFailed);
        assert_eq!(
            f.payments.get("pay_123").unwrap().status,
            PaymentStatus::Failed
        );
        assert!(!f.locks.is_held("pay_123"));
    }

    #[tokio::test]
    async fn ambiguous_send_leaves_payment_processing() {
        let batch = test_batch();
        let user = test_user(batch.id, Some("https://t.me/+L"));
        let payment = Payment::record(user.id, "pay_123", "order_456", 499900, "INR");
        let job = job_for(&user, "pay_123");

        let f = fixture(
            MockPaymentRepository::with_payment(payment),
            MockUserRepository::with_user(user),
            batch,
            MockProvisioner::new(),
            MockNotifier::new(NotifierMode::Ambiguous),
            "pay_123",
        );

        let outcome = f.handler.handle(job).await;
        assert_eq!(outcome, FulfillmentOutcome::SendAmbiguous);

        // Blocked from automatic retry: still processing, never failed.
        let payment = f.payments.get("pay_123").unwrap();
        assert_eq!(payment.status, PaymentStatus::Processing);
        assert!(!payment.email_sent);
        assert!(!f.locks.is_held("pay_123"));
    }

    #[tokio::test]
    async fn completion_write_failure_leaves_payment_processing() {
        let batch = test_batch();
        let user = test_user(batch.id, Some("https://t.me/+L"));
        let payment = Payment::record(user.id, "pay_123", "order_456", 499900, "INR");
        let job = job_for(&user, "pay_123");

        let f = fixture(
            MockPaymentRepository::failing_completion(payment),
            MockUserRepository::with_user(user),
            batch,
            MockProvisioner::new(),
            MockNotifier::new(NotifierMode::Succeed),
            "pay_123",
        );

        let outcome = f.handler.handle(job).await;
        assert_eq!(outcome, FulfillmentOutcome::CompletionUnrecorded);

        // The email went out, but status must stay processing (never
        // failed): a retry would re-send.
        let payment = f.payments.get("pay_123").unwrap();
        assert_eq!(payment.status, PaymentStatus::Processing);
        assert_eq!(f.notifier.sent().len(), 1);
        assert!(!f.locks.is_held("pay_123"));
    }

    #[tokio::test]
    async fn failed_then_retried_payment_can_complete() {
        let batch = test_batch();
        let user = test_user(batch.id, Some("https://t.me/+L"));
        let mut payment = Payment::record(user.id, "pay_123", "order_456", 499900, "INR");
        payment.fail().unwrap();
        payment.begin_reprocessing().unwrap();
        let job = job_for(&user, "pay_123");

        let f = fixture(
            MockPaymentRepository::with_payment(payment),
            MockUserRepository::with_user(user),
            batch,
            MockProvisioner::new(),
            MockNotifier::new(NotifierMode::Succeed),
            "pay_123",
        );

        let outcome = f.handler.handle(job).await;
        assert_eq!(outcome, FulfillmentOutcome::Completed);
        assert_eq!(
            f.payments.get("pay_123").unwrap().status,
            PaymentStatus::Completed
        );
    }
}
