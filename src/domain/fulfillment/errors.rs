//! Fulfillment-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidSignature | 400 |
//! | MalformedPayload | 400 |
//! | QueueUnavailable | 500 |
//! | Infrastructure | 500 |
//!
//! Duplicate deliveries and unknown users are NOT errors: webhook retries
//! are expected, so those paths acknowledge with a no-op message instead.

use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors surfaced by the webhook processing pipeline.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The webhook signature did not verify against the shared secret.
    #[error("webhook signature verification failed")]
    InvalidSignature,

    /// The body verified but does not carry a usable payment entity.
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    /// The fulfillment queue rejected the unit of work.
    #[error("fulfillment queue unavailable: {0}")]
    QueueUnavailable(String),

    /// A repository or lock-store failure.
    #[error("infrastructure error: {0}")]
    Infrastructure(#[from] DomainError),
}
