//! Email (SMTP) configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// SMTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP server hostname
    #[serde(default)]
    pub smtp_host: String,

    /// SMTP server port (465 implies implicit TLS, otherwise STARTTLS)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username
    #[serde(default)]
    pub smtp_username: String,

    /// SMTP password
    #[serde(default = "default_secret")]
    pub smtp_password: SecretString,

    /// Whether to negotiate TLS
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl EmailConfig {
    /// Whether the transport credentials are fully configured.
    pub fn is_configured(&self) -> bool {
        !self.smtp_host.is_empty()
            && !self.smtp_username.is_empty()
            && !self.smtp_password.expose_secret().is_empty()
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.smtp_host.is_empty() {
            return Err(ValidationError::MissingRequired("EMAIL__SMTP_HOST"));
        }
        if self.smtp_port == 0 {
            return Err(ValidationError::InvalidSmtpPort);
        }
        if self.smtp_username.is_empty() {
            return Err(ValidationError::MissingRequired("EMAIL__SMTP_USERNAME"));
        }
        if self.smtp_password.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("EMAIL__SMTP_PASSWORD"));
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: default_secret(),
            use_tls: default_use_tls(),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

fn default_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_smtp_port() -> u16 {
    465
}

fn default_use_tls() -> bool {
    true
}

fn default_from_email() -> String {
    "noreply@coursegate.in".to_string()
}

fn default_from_name() -> String {
    "CourseGate".to_string()
}
