//! Fulfillment settings snapshot.
//!
//! An immutable snapshot of the sender identity, built once from validated
//! configuration and passed down into each unit of work as a parameter.
//! Nothing in the pipeline reads ambient global state.

use serde::{Deserialize, Serialize};

/// Sender identity used when composing the fulfillment email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentSettings {
    /// Display name of the sender.
    pub sender_name: String,

    /// From address of the sender.
    pub sender_email: String,
}

impl FulfillmentSettings {
    pub fn new(sender_name: impl Into<String>, sender_email: impl Into<String>) -> Self {
        Self {
            sender_name: sender_name.into(),
            sender_email: sender_email.into(),
        }
    }

    /// Formatted "From" header value.
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.sender_name, self.sender_email)
    }
}
