use async_trait::async_trait;

use crate::{
    callback::{codes, CallbackToken},
    domain::ChatInfo,
    errors::Rejection,
    formatting::{escape_html, truncate_label},
    keyboard::KeyboardBuilder,
    messaging::types::CommandMessage,
    routing::CommandHandler,
    texts::MessageKey,
    Result,
};

use super::{queue_ops, views, App};

fn require_group(chat: &ChatInfo) -> Result<()> {
    if chat.is_private {
        return Err(Rejection::GroupOnly.into());
    }
    Ok(())
}

/// `/start` and `/help`.
pub(crate) struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn handle(&self, app: &App, msg: &CommandMessage) -> Result<()> {
        if !msg.chat.is_private {
            app.send(msg.chat.id, &app.text(MessageKey::Help, &[]), None)
                .await?;
            return Ok(());
        }
        let mut kb = KeyboardBuilder::new();
        kb.row(
            app.text(MessageKey::BtnMyChats, &[]),
            &CallbackToken::new(codes::LIST_CHATS),
        );
        app.send(
            msg.chat.id,
            &app.text(MessageKey::HelpPrivate, &[]),
            Some(kb.build()),
        )
        .await?;
        Ok(())
    }
}

/// `/queue`: the queues of this chat.
pub(crate) struct ListQueues;

#[async_trait]
impl CommandHandler for ListQueues {
    async fn handle(&self, app: &App, msg: &CommandMessage) -> Result<()> {
        require_group(&msg.chat)?;
        let Some(group) = app.store.group(msg.chat.id).await? else {
            return Err(Rejection::ChatDeleted.into());
        };
        let view = views::chat_queues(app, &group, 1, false).await?;
        app.send(msg.chat.id, &view.html, Some(view.keyboard)).await?;
        Ok(())
    }
}

/// `/createqueue <name>`
pub(crate) struct CreateQueue;

#[async_trait]
impl CommandHandler for CreateQueue {
    async fn handle(&self, app: &App, msg: &CommandMessage) -> Result<()> {
        require_group(&msg.chat)?;
        let queue = queue_ops::create_queue(
            app,
            msg.chat.id,
            msg.from.id,
            &msg.command.joined_params(),
        )
        .await?;

        let mut kb = KeyboardBuilder::new();
        kb.row(
            truncate_label(&queue.name, app.cfg.button_label_max_length),
            &CallbackToken::new(codes::GET_QUEUE).with_queue(queue.id),
        );
        app.send(
            msg.chat.id,
            &app.text(MessageKey::QueueCreated, &[&escape_html(&queue.name)]),
            Some(kb.build()),
        )
        .await?;
        Ok(())
    }
}

/// `/enqueue <name> [position]`
pub(crate) struct Enqueue;

#[async_trait]
impl CommandHandler for Enqueue {
    async fn handle(&self, app: &App, msg: &CommandMessage) -> Result<()> {
        require_group(&msg.chat)?;
        let (name, requested) = queue_ops::split_name_and_position(&msg.command.params);
        let queue = queue_ops::find_queue(app, msg.chat.id, &name).await?;
        let (queue, position) = queue_ops::enqueue(app, queue.id, msg.from.id, requested).await?;
        app.send(
            msg.chat.id,
            &app.text(
                MessageKey::Enqueued,
                &[&escape_html(&queue.name), &position.to_string()],
            ),
            None,
        )
        .await?;
        Ok(())
    }
}

/// `/dequeue <name>`
pub(crate) struct Dequeue;

#[async_trait]
impl CommandHandler for Dequeue {
    async fn handle(&self, app: &App, msg: &CommandMessage) -> Result<()> {
        require_group(&msg.chat)?;
        let queue = queue_ops::find_queue(app, msg.chat.id, &msg.command.joined_params()).await?;
        let queue = queue_ops::dequeue(app, queue.id, msg.from.id).await?;
        app.send(
            msg.chat.id,
            &app.text(MessageKey::Dequeued, &[&escape_html(&queue.name)]),
            None,
        )
        .await?;
        Ok(())
    }
}

/// `/removequeue <name>`: creator or chat admin only.
pub(crate) struct RemoveQueue;

#[async_trait]
impl CommandHandler for RemoveQueue {
    async fn handle(&self, app: &App, msg: &CommandMessage) -> Result<()> {
        require_group(&msg.chat)?;
        let queue = queue_ops::find_queue(app, msg.chat.id, &msg.command.joined_params()).await?;
        queue_ops::remove_queue(app, &queue, msg.from.id).await?;
        app.send(
            msg.chat.id,
            &app.text(MessageKey::QueueRemoved, &[&escape_html(&queue.name)]),
            None,
        )
        .await?;
        Ok(())
    }
}
