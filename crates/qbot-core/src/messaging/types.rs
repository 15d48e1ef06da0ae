use crate::{
    command::ParsedCommand,
    domain::{ChatInfo, MessageRef, UserInfo},
};

/// Transport-neutral incoming update.
///
/// The adapter builds these with explicit mapping functions; core never sees
/// transport library types.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(CommandMessage),
    Callback(CallbackQuery),
}

#[derive(Clone, Debug)]
pub struct CommandMessage {
    pub chat: ChatInfo,
    pub from: UserInfo,
    pub message: MessageRef,
    pub command: ParsedCommand,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub callback_id: String,
    pub from: UserInfo,
    /// Chat + message the pressed button belongs to (absent for very old messages).
    pub chat: Option<ChatInfo>,
    pub message: Option<MessageRef>,
    /// Raw, still-encoded token.
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

/// Inline keyboard, row by row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// All buttons in reading order.
    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}
