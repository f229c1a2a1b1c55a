//! Telegram Bot API configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Telegram configuration for invite provisioning
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token used to call the Bot API
    #[serde(default = "default_secret")]
    pub bot_token: SecretString,

    /// Bot API base URL (overridable for testing)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl TelegramConfig {
    /// Whether the bot token is configured.
    pub fn has_bot_token(&self) -> bool {
        !self.bot_token.expose_secret().is_empty()
    }

    /// Validate Telegram configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_bot_token() {
            return Err(ValidationError::MissingRequired("TELEGRAM__BOT_TOKEN"));
        }
        Ok(())
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: default_secret(),
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}
