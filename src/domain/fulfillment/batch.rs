//! Batch (cohort) entity.

use crate::domain::foundation::{BatchId, Timestamp};
use serde::{Deserialize, Serialize};

/// A course cohort backed by a private Telegram group.
///
/// The name is unique and is what checkout and webhook payloads refer to;
/// the chat id resolves which external group invites are issued against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,

    /// Unique batch name (e.g., "morning", "evening").
    pub name: String,

    /// Telegram chat id of the batch's private group.
    pub telegram_chat_id: String,

    pub created_at: Timestamp,
}
