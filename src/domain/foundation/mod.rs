//! Foundation types shared across the domain.
//!
//! Strongly-typed identifiers, an immutable UTC timestamp value object,
//! and the domain error taxonomy.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::{BatchId, PaymentRecordId, UserId};
pub use timestamp::Timestamp;
