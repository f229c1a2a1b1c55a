//! SMTP adapter for the fulfillment notifier.

mod smtp_notifier;
mod template;

pub use smtp_notifier::SmtpNotifier;
pub use template::FulfillmentEmailContent;
