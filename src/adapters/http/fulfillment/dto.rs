//! HTTP DTOs (Data Transfer Objects) for the fulfillment endpoints.
//!
//! These types define the JSON request/response structure at the HTTP
//! boundary. The provider-facing webhook acknowledgment and the client-facing
//! invite responses are wire contracts; field names are deliberate.

use serde::{Deserialize, Serialize};

use crate::application::handlers::fulfillment::WebhookOutcome;
use crate::config::AppConfig;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request body for the polling invite lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct GetInviteLinkRequest {
    /// Provider payment id returned to the client at checkout.
    #[serde(rename = "paymentId")]
    pub payment_id: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgment returned to the payment provider.
///
/// Every handled webhook path answers `{"status":"ok"}`, optionally with a
/// message describing the no-op taken; the provider must never be given a
/// reason to retry a handled delivery.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<WebhookOutcome> for WebhookAck {
    fn from(outcome: WebhookOutcome) -> Self {
        Self {
            status: "ok",
            message: outcome.message(),
        }
    }
}

/// Successful invite retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct InviteSuccessResponse {
    pub success: bool,

    #[serde(rename = "inviteLink")]
    pub invite_link: String,

    #[serde(rename = "batchType")]
    pub batch_type: String,

    /// Current payment status; present on the single-shot endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    pub message: &'static str,
}

/// Failed invite retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct InviteFailureResponse {
    pub success: bool,

    pub error: &'static str,

    /// Coarse payment status (`not_found`, `processing`, `failed`, ...);
    /// present on the single-shot endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

/// Error body for rejected or failed requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Operational status report: which external integrations are configured.
/// Booleans only; secrets never leave the process.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatusResponse {
    pub server: &'static str,
    pub timestamp: String,
    pub environment: ConfigReport,
}

/// Config-presence snapshot built once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub payment: PaymentReport,
    pub telegram: TelegramReport,
    pub smtp: SmtpReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReport {
    #[serde(rename = "keyId")]
    pub key_id: bool,
    #[serde(rename = "webhookSecret")]
    pub webhook_secret: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TelegramReport {
    #[serde(rename = "botToken")]
    pub bot_token: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmtpReport {
    pub host: bool,
    pub port: bool,
    pub user: bool,
}

impl ConfigReport {
    /// Builds the presence report from loaded configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            payment: PaymentReport {
                key_id: config.payment.key_id.is_some(),
                webhook_secret: config.payment.has_webhook_secret(),
            },
            telegram: TelegramReport {
                bot_token: config.telegram.has_bot_token(),
            },
            smtp: SmtpReport {
                host: !config.email.smtp_host.is_empty(),
                port: config.email.smtp_port != 0,
                user: !config.email.smtp_username.is_empty(),
            },
        }
    }
}
