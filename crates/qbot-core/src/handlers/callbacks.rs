use async_trait::async_trait;

use crate::{
    domain::Queue,
    errors::Rejection,
    pagination::requested_page,
    routing::{CallbackContext, CallbackHandler, Notice},
    texts::MessageKey,
    Result,
};

use super::{queue_ops, token_queue, views, App};

/// Queue named by the token, if the presser may see it.
async fn queue_for(app: &App, ctx: &CallbackContext) -> Result<Queue> {
    let queue = app.load_queue(token_queue(&ctx.token)?).await?;
    app.ensure_group_member(queue.group_id, ctx.from.id).await?;
    Ok(queue)
}

async fn show_queue(app: &App, ctx: &CallbackContext, queue: &Queue) -> Result<()> {
    let view = views::queue(app, queue).await?;
    app.show(ctx, &view.html, Some(view.keyboard)).await
}

/// `lc`: groups the presser has been seen in.
pub(crate) struct ListChats;

#[async_trait]
impl CallbackHandler for ListChats {
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>> {
        let view = views::chats(app, ctx.from.id, requested_page(&ctx.token)).await?;
        app.show(ctx, &view.html, Some(view.keyboard)).await?;
        Ok(None)
    }
}

/// `gc`: queues of one group.
pub(crate) struct GetChat;

#[async_trait]
impl CallbackHandler for GetChat {
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>> {
        let Some(chat_id) = ctx.token.chat_id else {
            return Err(Rejection::OutdatedCallback.into());
        };
        app.ensure_group_member(chat_id, ctx.from.id).await?;
        let Some(group) = app.store.group(chat_id).await? else {
            return Err(Rejection::ChatDeleted.into());
        };
        let in_private = ctx.chat.as_ref().is_some_and(|c| c.is_private);
        let view = views::chat_queues(app, &group, requested_page(&ctx.token), in_private).await?;
        app.show(ctx, &view.html, Some(view.keyboard)).await?;
        Ok(None)
    }
}

/// `gq`: the queue screen, also used as "refresh".
pub(crate) struct GetQueue;

#[async_trait]
impl CallbackHandler for GetQueue {
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>> {
        let queue = queue_for(app, ctx).await?;
        show_queue(app, ctx, &queue).await?;
        Ok(None)
    }
}

/// `em`: join at the first free position.
pub(crate) struct EnqueueMe;

#[async_trait]
impl CallbackHandler for EnqueueMe {
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>> {
        let queue = queue_for(app, ctx).await?;
        let (queue, position) = queue_ops::enqueue(app, queue.id, ctx.from.id, None).await?;
        show_queue(app, ctx, &queue).await?;
        Ok(Some(Notice::with(
            MessageKey::Enqueued,
            vec![queue.name, position.to_string()],
        )))
    }
}

/// `eq`: the position picker. Dynamic queues assign positions themselves.
pub(crate) struct ChoosePosition;

#[async_trait]
impl CallbackHandler for ChoosePosition {
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>> {
        let queue = queue_for(app, ctx).await?;
        if queue.is_dynamic {
            return Err(Rejection::DynamicQueuePosition.into());
        }
        if queue.is_member(ctx.from.id) {
            return Err(Rejection::AlreadyParticipates.into());
        }
        let view = views::position_picker(app, &queue, requested_page(&ctx.token));
        app.show(ctx, &view.html, Some(view.keyboard)).await?;
        Ok(None)
    }
}

/// `ea`: join at the position carried by the button.
pub(crate) struct EnqueueAt;

#[async_trait]
impl CallbackHandler for EnqueueAt {
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>> {
        let Some(requested) = ctx.token.position() else {
            return Err(Rejection::OutdatedCallback.into());
        };
        let queue = queue_for(app, ctx).await?;
        let (queue, position) =
            queue_ops::enqueue(app, queue.id, ctx.from.id, Some(requested)).await?;
        show_queue(app, ctx, &queue).await?;
        Ok(Some(Notice::with(
            MessageKey::Enqueued,
            vec![queue.name, position.to_string()],
        )))
    }
}

/// `dm`: leave the queue.
pub(crate) struct DequeueMe;

#[async_trait]
impl CallbackHandler for DequeueMe {
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>> {
        let queue = queue_for(app, ctx).await?;
        let queue = queue_ops::dequeue(app, queue.id, ctx.from.id).await?;
        show_queue(app, ctx, &queue).await?;
        Ok(Some(Notice::with(MessageKey::Dequeued, vec![queue.name])))
    }
}

/// `rq`: ask, then remove on `a=true` or go back on `a=false`.
pub(crate) struct RemoveQueue;

#[async_trait]
impl CallbackHandler for RemoveQueue {
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>> {
        let queue = queue_for(app, ctx).await?;
        match ctx.token.agreement {
            None => {
                if !app.can_manage(&queue, ctx.from.id).await? {
                    return Err(Rejection::NoRights.into());
                }
                let view = views::confirm_remove(app, &queue);
                app.show(ctx, &view.html, Some(view.keyboard)).await?;
                Ok(None)
            }
            Some(true) => {
                queue_ops::remove_queue(app, &queue, ctx.from.id).await?;
                let view = views::queue_removed(app, &queue.name, queue.group_id);
                app.show(ctx, &view.html, Some(view.keyboard)).await?;
                Ok(Some(Notice::with(MessageKey::QueueRemoved, vec![queue.name])))
            }
            Some(false) => {
                show_queue(app, ctx, &queue).await?;
                Ok(None)
            }
        }
    }
}

/// `sd`: toggle dynamic mode.
pub(crate) struct SwitchDynamic;

#[async_trait]
impl CallbackHandler for SwitchDynamic {
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>> {
        let queue = queue_for(app, ctx).await?;
        let queue = queue_ops::toggle_dynamic(app, &queue, ctx.from.id).await?;
        show_queue(app, ctx, &queue).await?;
        let key = if queue.is_dynamic {
            MessageKey::QueueNowDynamic
        } else {
            MessageKey::QueueNowStatic
        };
        Ok(Some(Notice::with(key, vec![queue.name])))
    }
}
