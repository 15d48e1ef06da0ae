use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, UserId},
    messaging::types::InlineKeyboard,
    Result,
};

/// Chat transport port.
///
/// Messages are HTML formatted. `edit_message` returns
/// [`Error::MessageNotModified`](crate::Error::MessageNotModified) when the new
/// content equals the old one; callers treat that as success.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef>;

    async fn edit_message(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str, notice: Option<&str>) -> Result<()>;

    async fn chat_administrators(&self, chat_id: ChatId) -> Result<Vec<UserId>>;
}
