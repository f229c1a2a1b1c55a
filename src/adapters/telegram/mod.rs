//! Telegram Bot API adapter for invite provisioning.

mod invite_provisioner;

pub use invite_provisioner::TelegramInviteProvisioner;
