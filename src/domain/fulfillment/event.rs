//! Provider webhook event types.
//!
//! Serde model of the payment provider's webhook envelope. Only fields
//! relevant to fulfillment are captured; everything else in the provider's
//! full event schema is ignored.

use serde::{Deserialize, Serialize};

/// Provider webhook envelope (simplified).
///
/// ```json
/// {
///   "event": "payment.captured",
///   "payload": { "payment": { "entity": { ... } } }
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookEnvelope {
    /// Event name (e.g., "payment.captured").
    #[serde(default)]
    pub event: String,

    /// Event payload, shaped per event type.
    #[serde(default)]
    pub payload: WebhookPayload,
}

/// Container for the event payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookPayload {
    /// Payment payload, present for payment.* events.
    #[serde(default)]
    pub payment: Option<PaymentPayload>,
}

/// Wrapper around the payment entity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentPayload {
    pub entity: PaymentEntity,
}

/// The provider's payment entity, trimmed to the fields fulfillment needs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEntity {
    /// Provider-assigned payment id (stable, unique).
    pub id: String,

    /// Provider-assigned order id the payment belongs to.
    #[serde(default)]
    pub order_id: String,

    /// Email the customer paid with; the fulfillment lookup key.
    #[serde(default)]
    pub email: String,

    /// Amount in the provider's minor currency unit.
    #[serde(default)]
    pub amount: i64,

    /// ISO currency code.
    #[serde(default)]
    pub currency: String,
}

/// Known provider event types that fulfillment distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEventType {
    /// Payment captured; the only event that triggers fulfillment.
    PaymentCaptured,
    /// Any other event; acknowledged without side effects.
    Other(String),
}

impl ProviderEventType {
    /// Parse event type from the envelope's event string.
    pub fn parse(s: &str) -> Self {
        match s {
            "payment.captured" => Self::PaymentCaptured,
            other => Self::Other(other.to_string()),
        }
    }
}

impl WebhookEnvelope {
    /// The typed event this envelope carries.
    pub fn event_type(&self) -> ProviderEventType {
        ProviderEventType::parse(&self.event)
    }

    /// The payment entity, if the payload carries one.
    pub fn payment_entity(&self) -> Option<&PaymentEntity> {
        self.payload.payment.as_ref().map(|p| &p.entity)
    }
}
