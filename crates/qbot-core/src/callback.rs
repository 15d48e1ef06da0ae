//! Callback token codec.
//!
//! Button payloads are capped at 64 bytes by Telegram, so tokens use one-letter
//! keys and omit absent fields entirely. Anything that does not decode against
//! the current schema is reported as [`OutdatedCallback`].

use serde::{Deserialize, Serialize};

use crate::domain::{ChatId, QueueId, UserId};

/// Telegram's limit for `callback_data`.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// Callback command vocabulary (short codes).
pub mod codes {
    pub const LIST_CHATS: &str = "lc";
    pub const GET_CHAT: &str = "gc";
    pub const GET_QUEUE: &str = "gq";
    pub const DEQUEUE_ME: &str = "dm";
    /// Show the "choose a position" picker.
    pub const ENQUEUE: &str = "eq";
    pub const REMOVE_QUEUE: &str = "rq";
    pub const ENQUEUE_ME: &str = "em";
    pub const ENQUEUE_AT: &str = "ea";
    pub const SWITCH_QUEUE_DYNAMIC: &str = "sd";
    pub const EXCHANGE_POSITIONS: &str = "xp";
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueRef {
    #[serde(rename = "i", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QueueId>,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallbackToken {
    #[serde(rename = "c")]
    pub command: String,
    #[serde(rename = "i", default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueRef>,
    /// Tri-state: absent (not asked yet), `false` (declined), `true` (agreed).
    #[serde(rename = "a", default, skip_serializing_if = "Option::is_none")]
    pub agreement: Option<bool>,
}

/// The token could not be decoded against the current schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("outdated callback")]
pub struct OutdatedCallback;

impl CallbackToken {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            chat_id: None,
            user_id: None,
            page: None,
            queue: None,
            agreement: None,
        }
    }

    pub fn with_chat(mut self, chat_id: ChatId) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_queue(mut self, queue_id: QueueId) -> Self {
        self.queue.get_or_insert_with(QueueRef::default).id = Some(queue_id);
        self
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.queue.get_or_insert_with(QueueRef::default).position = Some(position);
        self
    }

    pub fn with_agreement(mut self, agreed: bool) -> Self {
        self.agreement = Some(agreed);
        self
    }

    /// Same token with a different command; everything else is carried over.
    pub fn retarget(&self, command: &str) -> Self {
        Self {
            command: command.to_string(),
            ..self.clone()
        }
    }

    pub fn queue_id(&self) -> Option<QueueId> {
        self.queue.and_then(|q| q.id)
    }

    pub fn position(&self) -> Option<u32> {
        self.queue.and_then(|q| q.position)
    }

    pub fn encode(&self) -> String {
        // Serializing plain integers/strings/bools cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(data: &str) -> std::result::Result<Self, OutdatedCallback> {
        let token: Self = serde_json::from_str(data).map_err(|_| OutdatedCallback)?;
        if token.command.trim().is_empty() {
            return Err(OutdatedCallback);
        }
        Ok(token)
    }

    pub fn fits_button(&self) -> bool {
        self.encode().len() <= MAX_CALLBACK_DATA_LEN
    }
}
