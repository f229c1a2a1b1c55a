//! Telegram invite provisioner adapter.
//!
//! Implements the `InviteProvisioner` port against the Telegram Bot API.
//! Issues single-use (`member_limit: 1`) invite links into a batch's private
//! group via `createChatInviteLink`.
//!
//! # Idempotency
//!
//! The reuse rule lives here, in front of the network call: a user who
//! already holds an invite for the requested batch gets it back unchanged.
//! Re-issuing would hand out a fresh one-time link and strand the one
//! already emailed.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::TelegramConfig;
use crate::domain::fulfillment::{Batch, User};
use crate::ports::{InviteLink, InviteProvisioner, ProvisionError};

/// Telegram Bot API implementation of the InviteProvisioner port.
pub struct TelegramInviteProvisioner {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramInviteProvisioner {
    /// Creates a new provisioner with the given configuration.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn create_invite_link(&self, chat_id: &str) -> Result<String, ProvisionError> {
        let token = self.config.bot_token.expose_secret();
        if token.is_empty() {
            return Err(ProvisionError::NotConfigured("bot token"));
        }

        let url = format!(
            "{}/bot{}/createChatInviteLink",
            self.config.api_base_url, token
        );
        let request = CreateInviteLinkRequest {
            chat_id,
            member_limit: 1,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        let envelope: BotApiResponse = response
            .json()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        if !envelope.ok {
            return Err(ProvisionError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown Bot API error".to_string()),
            ));
        }

        envelope
            .result
            .map(|r| r.invite_link)
            .ok_or_else(|| ProvisionError::Api("ok response without invite link".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct CreateInviteLinkRequest<'a> {
    chat_id: &'a str,
    member_limit: u32,
}

/// Bot API response envelope; any non-ok answer is a hard failure.
#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<ChatInviteLink>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatInviteLink {
    invite_link: String,
}

#[async_trait]
impl InviteProvisioner for TelegramInviteProvisioner {
    async fn ensure_invite(
        &self,
        user: &User,
        batch: &Batch,
    ) -> Result<InviteLink, ProvisionError> {
        if let Some(existing) = user.reusable_invite_for(batch) {
            return Ok(InviteLink::reused(existing));
        }

        let url = self.create_invite_link(&batch.telegram_chat_id).await?;
        Ok(InviteLink::issued(url))
    }
}
