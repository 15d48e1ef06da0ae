//! `xp`: the position exchange handshake, see [`crate::swap`].

use async_trait::async_trait;

use crate::{
    domain::{ChatId, Queue, UserId},
    errors::{Error, Rejection},
    formatting::{escape_html, mention},
    keyboard::KeyboardBuilder,
    pagination::requested_page,
    routing::{CallbackContext, CallbackHandler, Notice},
    swap::{self, SwapResolution, SwapStage},
    texts::MessageKey,
    Result,
};

use super::{token_queue, views, App};

pub(crate) struct ExchangePositions;

#[async_trait]
impl CallbackHandler for ExchangePositions {
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>> {
        let Some(stage) = SwapStage::from_token(&ctx.token) else {
            return Err(Rejection::OutdatedCallback.into());
        };
        let queue = app.load_queue(token_queue(&ctx.token)?).await?;

        match stage {
            SwapStage::PickTarget => pick_target(app, ctx, &queue).await,
            SwapStage::Propose {
                target,
                source_position,
            } => propose(app, ctx, &queue, target, source_position).await,
            SwapStage::Answer {
                requester,
                source_position,
                accepted: true,
            } => accept(app, ctx, &queue, requester, source_position).await,
            SwapStage::Answer {
                requester,
                accepted: false,
                ..
            } => decline(app, ctx, &queue, requester).await,
        }
    }
}

async fn pick_target(app: &App, ctx: &CallbackContext, queue: &Queue) -> Result<Option<Notice>> {
    app.ensure_group_member(queue.group_id, ctx.from.id).await?;
    let Some(position) = queue.position_of(ctx.from.id) else {
        return Err(Rejection::NotParticipating.into());
    };
    let view = views::swap_targets(app, queue, ctx.from.id, position, requested_page(&ctx.token))
        .await?;
    app.show(ctx, &view.html, Some(view.keyboard)).await?;
    Ok(None)
}

async fn propose(
    app: &App,
    ctx: &CallbackContext,
    queue: &Queue,
    target: UserId,
    source_position: u32,
) -> Result<Option<Notice>> {
    let requester = ctx.from.id;
    app.ensure_group_member(queue.group_id, requester).await?;
    if requester == target {
        return Err(Rejection::SwapWithSelf.into());
    }
    match queue.position_of(requester) {
        None => return Err(Rejection::NotParticipating.into()),
        Some(current) if current != source_position => {
            return Err(Rejection::SwapStale(current).into())
        }
        Some(_) => {}
    }
    let Some(target_position) = queue.position_of(target) else {
        return Err(Rejection::TargetLeft.into());
    };

    let requester_user = app.user(requester).await?;
    let target_user = app.user(target).await?;
    let html = app.text(
        MessageKey::SwapProposal,
        &[
            &mention(&requester_user),
            &escape_html(&queue.name),
            &source_position.to_string(),
            &target_position.to_string(),
        ],
    );
    let mut kb = KeyboardBuilder::new();
    kb.button(
        app.text(MessageKey::BtnAccept, &[]),
        &swap::answer_token(queue.id, requester, source_position, true),
    );
    kb.button(
        app.text(MessageKey::BtnDecline, &[]),
        &swap::answer_token(queue.id, requester, source_position, false),
    );

    if let Err(e) = app.send(ChatId::from(target), &html, Some(kb.build())).await {
        tracing::warn!(queue_id = queue.id.0, target = target.0, error = %e, "cannot deliver swap proposal");
        return Err(Rejection::TargetUnreachable.into());
    }
    tracing::info!(
        queue_id = queue.id.0,
        requester = requester.0,
        target = target.0,
        "swap proposed"
    );
    Ok(Some(Notice::with(
        MessageKey::SwapProposalSent,
        vec![target_user.display_name()],
    )))
}

async fn accept(
    app: &App,
    ctx: &CallbackContext,
    queue: &Queue,
    requester: UserId,
    source_position: u32,
) -> Result<Option<Notice>> {
    let target = ctx.from.id;
    if requester == target {
        return Err(Rejection::SwapWithSelf.into());
    }

    let resolution = app
        .store
        .swap_positions(queue.id, requester, source_position, target)
        .await?
        .ok_or(Rejection::QueueDeleted)?;
    let (requester_position, target_position) = match resolution {
        SwapResolution::Swap {
            requester_position,
            target_position,
        } => (requester_position, target_position),
        SwapResolution::Stale { current } => {
            return close_proposal(app, ctx, Rejection::SwapStale(current)).await
        }
        SwapResolution::RequesterLeft => {
            return close_proposal(app, ctx, Rejection::RequesterLeft).await
        }
        SwapResolution::TargetLeft => {
            return close_proposal(app, ctx, Rejection::NotParticipating).await
        }
    };
    tracing::info!(
        queue_id = queue.id.0,
        requester = requester.0,
        target = target.0,
        requester_position = target_position,
        target_position = requester_position,
        "positions exchanged"
    );

    let name = escape_html(&queue.name);
    if let Some(msg) = ctx.message {
        app.edit(
            msg,
            &app.text(MessageKey::SwapDone, &[&name, &requester_position.to_string()]),
            None,
        )
        .await?;
    }
    let target_user = app.user(target).await?;
    let note = app.text(
        MessageKey::SwapAcceptedRequester,
        &[&mention(&target_user), &name, &target_position.to_string()],
    );
    notify_requester(app, queue, requester, &note).await;
    Ok(None)
}

async fn decline(
    app: &App,
    ctx: &CallbackContext,
    queue: &Queue,
    requester: UserId,
) -> Result<Option<Notice>> {
    if let Some(msg) = ctx.message {
        app.edit(msg, &app.text(MessageKey::SwapDeclinedTarget, &[]), None)
            .await?;
    }
    let target_user = app.user(ctx.from.id).await?;
    let note = app.text(
        MessageKey::SwapDeclinedRequester,
        &[&mention(&target_user), &escape_html(&queue.name)],
    );
    notify_requester(app, queue, requester, &note).await;
    Ok(None)
}

/// Replace the Accept/Decline message with the reason it no longer applies.
async fn close_proposal(
    app: &App,
    ctx: &CallbackContext,
    reason: Rejection,
) -> Result<Option<Notice>> {
    if let Some(msg) = ctx.message {
        app.edit(msg, &reason.render(app.texts.as_ref()), None).await?;
    }
    Err(Error::Rejected(reason))
}

/// Tell the requester privately, or in the group when that fails.
async fn notify_requester(app: &App, queue: &Queue, requester: UserId, html: &str) {
    if app.send(ChatId::from(requester), html, None).await.is_ok() {
        return;
    }
    if let Err(e) = app.send(queue.group_id, html, None).await {
        tracing::warn!(queue_id = queue.id.0, requester = requester.0, error = %e, "cannot notify swap requester");
    }
}
