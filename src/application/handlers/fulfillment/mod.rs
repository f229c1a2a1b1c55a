//! Fulfillment command and query handlers.

mod fulfill_payment;
mod get_invite_link;
mod process_webhook;

pub use fulfill_payment::{FulfillPaymentHandler, FulfillmentOutcome};
pub use get_invite_link::{
    GetInviteLinkHandler, InviteLookup, InviteLookupState, PollConfig, RetrieveInviteLinkHandler,
};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, WebhookOutcome};
