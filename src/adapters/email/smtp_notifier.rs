//! SMTP implementation of the fulfillment notifier.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;

use crate::config::EmailConfig;
use crate::domain::fulfillment::FulfillmentSettings;
use crate::ports::{FulfillmentEmail, FulfillmentNotifier, NotifyError};

use super::template::FulfillmentEmailContent;

/// SMTP implementation of the FulfillmentNotifier port.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Creates a notifier from SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when host or credentials are missing, and
    /// `Rejected` when TLS/relay parameters cannot be constructed.
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        if config.smtp_host.is_empty() {
            return Err(NotifyError::NotConfigured("smtp host"));
        }
        if config.smtp_username.is_empty() || config.smtp_password.expose_secret().is_empty() {
            return Err(NotifyError::NotConfigured("smtp credentials"));
        }

        let mut builder = if config.use_tls {
            let tls_params = TlsParameters::new(config.smtp_host.clone())
                .map_err(|e| NotifyError::Rejected(format!("TLS configuration error: {}", e)))?;

            // Port 465 uses implicit TLS (SMTPS), other ports use STARTTLS
            if config.smtp_port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                    .map_err(|e| NotifyError::Rejected(format!("SMTP relay error: {}", e)))?
                    .port(config.smtp_port)
                    .tls(Tls::Wrapper(tls_params))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                    .map_err(|e| NotifyError::Rejected(format!("SMTP relay error: {}", e)))?
                    .port(config.smtp_port)
                    .tls(Tls::Required(tls_params))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
        };

        builder = builder.credentials(Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().clone(),
        ));

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl FulfillmentNotifier for SmtpNotifier {
    async fn send(
        &self,
        email: &FulfillmentEmail,
        settings: &FulfillmentSettings,
    ) -> Result<(), NotifyError> {
        let content = FulfillmentEmailContent::new(email);

        let message = Message::builder()
            .from(
                settings
                    .from_header()
                    .parse()
                    .map_err(|e| NotifyError::Rejected(format!("Invalid from address: {}", e)))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| NotifyError::Rejected(format!("Invalid to address: {}", e)))?)
            .subject(content.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(content.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(content.html),
                    ),
            )
            .map_err(|e| NotifyError::Rejected(format!("Failed to build email: {}", e)))?;

        match self.transport.send(message).await {
            Ok(_) => Ok(()),
            // A definitive SMTP status means the server refused the message:
            // nothing was delivered and a retry is safe.
            Err(err) if err.is_permanent() || err.is_transient() => {
                Err(NotifyError::Rejected(err.to_string()))
            }
            // Anything else (timeout, dropped connection, TLS teardown) is
            // ambiguous: the message may already be in the customer's inbox.
            Err(err) => Err(NotifyError::Ambiguous(err.to_string())),
        }
    }
}
