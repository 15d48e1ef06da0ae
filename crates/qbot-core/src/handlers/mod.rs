//! Command and callback handlers.
//!
//! Handlers are the only code that talks to the store. Expected conditions are
//! returned as [`Rejection`] values and rendered by the dispatcher.

use std::sync::Arc;

use crate::{
    callback::{codes, CallbackToken},
    command,
    config::Config,
    domain::{ChatId, MessageRef, Queue, QueueId, User, UserId},
    errors::{Error, Rejection},
    messaging::{port::ChatTransport, types::InlineKeyboard},
    routing::{CallbackContext, CallbackRouter, CommandRouter},
    store::QueueStore,
    texts::{MessageKey, TextProvider},
    Result,
};

mod callbacks;
mod commands;
mod exchange;
mod queue_ops;
mod views;

/// Request-independent collaborators, shared by every handler.
#[derive(Clone)]
pub struct App {
    pub cfg: Arc<Config>,
    pub store: Arc<dyn QueueStore>,
    pub transport: Arc<dyn ChatTransport>,
    pub texts: Arc<dyn TextProvider>,
}

impl App {
    pub fn text(&self, key: MessageKey, params: &[&str]) -> String {
        self.texts.message(key, params)
    }

    pub async fn send(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        self.transport.send_message(chat_id, html, keyboard).await
    }

    /// Edit a message; an edit that changes nothing counts as success.
    pub async fn edit(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        match self.transport.edit_message(msg, html, keyboard).await {
            Err(Error::MessageNotModified) => Ok(()),
            other => other,
        }
    }

    /// Replace the message a button belongs to, or post a new one when the
    /// original is not available.
    pub async fn show(
        &self,
        ctx: &CallbackContext,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        if let Some(msg) = ctx.message {
            return self.edit(msg, html, keyboard).await;
        }
        let chat_id = ctx
            .chat
            .as_ref()
            .map(|c| c.id)
            .unwrap_or_else(|| ChatId::from(ctx.from.id));
        self.send(chat_id, html, keyboard).await.map(|_| ())
    }

    pub async fn load_queue(&self, id: QueueId) -> Result<Queue> {
        self.store
            .queue(id)
            .await?
            .ok_or_else(|| Rejection::QueueDeleted.into())
    }

    /// The stored profile, or a placeholder named after the id.
    pub async fn user(&self, id: UserId) -> Result<User> {
        Ok(self.store.user(id).await?.unwrap_or_else(|| User {
            id,
            first_name: format!("#{}", id.0),
            last_name: None,
        }))
    }

    pub async fn is_chat_admin(&self, chat_id: ChatId, user: UserId) -> Result<bool> {
        Ok(self
            .transport
            .chat_administrators(chat_id)
            .await?
            .contains(&user))
    }

    /// Creator or chat administrator.
    pub async fn can_manage(&self, queue: &Queue, user: UserId) -> Result<bool> {
        if queue.creator_id == user {
            return Ok(true);
        }
        self.is_chat_admin(queue.group_id, user).await
    }

    /// Reaching a group through a token requires having been seen in it.
    pub async fn ensure_group_member(&self, group: ChatId, user: UserId) -> Result<()> {
        let Some(g) = self.store.group(group).await? else {
            return Err(Rejection::ChatDeleted.into());
        };
        if !g.members.contains(&user) {
            return Err(Rejection::NoRights.into());
        }
        Ok(())
    }
}

/// Queue id a token must carry; a token without one is from an older schema.
pub(crate) fn token_queue(token: &CallbackToken) -> Result<QueueId> {
    token
        .queue_id()
        .ok_or_else(|| Rejection::OutdatedCallback.into())
}

/// Build the routing tables with every handler of the bot.
pub fn build_routers() -> Result<(CommandRouter, CallbackRouter)> {
    let mut cmds = CommandRouter::new();
    cmds.register(command::START, Arc::new(commands::Help))?;
    cmds.register(command::HELP, Arc::new(commands::Help))?;
    cmds.register(command::QUEUE, Arc::new(commands::ListQueues))?;
    cmds.register(command::CREATE_QUEUE, Arc::new(commands::CreateQueue))?;
    cmds.register(command::ENQUEUE, Arc::new(commands::Enqueue))?;
    cmds.register(command::DEQUEUE, Arc::new(commands::Dequeue))?;
    cmds.register(command::REMOVE_QUEUE, Arc::new(commands::RemoveQueue))?;

    let mut cbs = CallbackRouter::new();
    cbs.register(codes::LIST_CHATS, Arc::new(callbacks::ListChats))?;
    cbs.register(codes::GET_CHAT, Arc::new(callbacks::GetChat))?;
    cbs.register(codes::GET_QUEUE, Arc::new(callbacks::GetQueue))?;
    cbs.register(codes::DEQUEUE_ME, Arc::new(callbacks::DequeueMe))?;
    cbs.register(codes::ENQUEUE, Arc::new(callbacks::ChoosePosition))?;
    cbs.register(codes::REMOVE_QUEUE, Arc::new(callbacks::RemoveQueue))?;
    cbs.register(codes::ENQUEUE_ME, Arc::new(callbacks::EnqueueMe))?;
    cbs.register(codes::ENQUEUE_AT, Arc::new(callbacks::EnqueueAt))?;
    cbs.register(codes::SWITCH_QUEUE_DYNAMIC, Arc::new(callbacks::SwitchDynamic))?;
    cbs.register(codes::EXCHANGE_POSITIONS, Arc::new(exchange::ExchangePositions))?;

    Ok((cmds, cbs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_the_full_vocabulary() {
        let (cmds, cbs) = build_routers().unwrap();
        assert_eq!(cmds.len(), 7);
        assert_eq!(cbs.len(), 10);
        assert!(cmds.get("/CreateQueue").is_some());
        assert!(cbs.get(codes::EXCHANGE_POSITIONS).is_some());
    }
}
