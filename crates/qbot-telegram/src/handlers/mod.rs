//! Telegram update handlers.
//!
//! Each handler maps a teloxide update into an [`IncomingUpdate`] and hands it
//! to the core dispatcher. Non-command messages are ignored.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery as TgCallbackQuery, Message},
};

use qbot_core::{
    command::parse_command,
    dispatch::UpdateDispatcher,
    messaging::types::{CallbackQuery, CommandMessage, IncomingUpdate},
};

use crate::{chat_info, message_ref, user_info};

pub fn command_update(msg: &Message) -> Option<IncomingUpdate> {
    let command = parse_command(msg.text()?)?;
    let from = msg.from()?;
    Some(IncomingUpdate::Command(CommandMessage {
        chat: chat_info(&msg.chat),
        from: user_info(from),
        message: message_ref(msg),
        command,
    }))
}

pub fn callback_update(q: &TgCallbackQuery) -> IncomingUpdate {
    IncomingUpdate::Callback(CallbackQuery {
        callback_id: q.id.clone(),
        from: user_info(&q.from),
        chat: q.message.as_ref().map(|m| chat_info(&m.chat)),
        message: q.message.as_ref().map(message_ref),
        data: q.data.clone().unwrap_or_default(),
    })
}

pub async fn handle_message(msg: Message, dispatcher: Arc<UpdateDispatcher>) -> ResponseResult<()> {
    if let Some(update) = command_update(&msg) {
        dispatcher.handle(update).await;
    }
    Ok(())
}

pub async fn handle_callback(
    q: TgCallbackQuery,
    dispatcher: Arc<UpdateDispatcher>,
) -> ResponseResult<()> {
    dispatcher.handle(callback_update(&q)).await;
    Ok(())
}
