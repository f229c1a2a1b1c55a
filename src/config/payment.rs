//! Payment provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment provider configuration (Razorpay)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Webhook signing secret shared with the provider dashboard
    #[serde(default = "default_secret")]
    pub webhook_secret: SecretString,

    /// Provider key id; reported (as a boolean) by the status endpoint
    #[serde(default)]
    pub key_id: Option<String>,
}

impl PaymentConfig {
    /// Whether the webhook secret is configured.
    ///
    /// Signature verification fails closed when it is not, so an
    /// unconfigured secret means every webhook delivery is rejected.
    pub fn has_webhook_secret(&self) -> bool {
        !self.webhook_secret.expose_secret().is_empty()
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_webhook_secret() {
            return Err(ValidationError::MissingRequired("PAYMENT__WEBHOOK_SECRET"));
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            webhook_secret: default_secret(),
            key_id: None,
        }
    }
}

fn default_secret() -> SecretString {
    SecretString::new(String::new())
}
