//! coursegate - Payment-Event Fulfillment Backend
//!
//! Receives payment-captured webhooks from the payment provider and
//! deterministically delivers a single-use Telegram group invite to the
//! customer by email, exactly once per payment, using PostgreSQL rows for
//! idempotency tracking and mutual exclusion.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
