//! Queue mutations shared by command and callback handlers.

use crate::{
    domain::{ChatId, NewQueue, Queue, QueueId, UserId},
    errors::{Conflict, Error, Rejection},
    positions,
    Result,
};

use super::App;

/// Trim and validate a queue name.
pub(crate) fn validate_queue_name(raw: &str, max_len: usize) -> std::result::Result<String, Rejection> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(Rejection::QueueNameMissing);
    }
    if name.chars().count() > max_len {
        return Err(Rejection::QueueNameTooLong(max_len));
    }
    if name.chars().all(|c| c.is_ascii_digit() || c.is_whitespace()) {
        return Err(Rejection::InvalidQueueName);
    }
    Ok(name)
}

/// Split `/enqueue` parameters into a queue name and an optional position.
///
/// Queue names are never purely numeric, so a trailing number is a position.
pub(crate) fn split_name_and_position(params: &[String]) -> (String, Option<u32>) {
    match params.split_last() {
        Some((last, rest)) if !rest.is_empty() && last.chars().all(|c| c.is_ascii_digit()) => {
            let position = last.parse::<u32>().unwrap_or(u32::MAX);
            (rest.join(" "), Some(position))
        }
        _ => (params.join(" "), None),
    }
}

pub(crate) async fn find_queue(app: &App, group: ChatId, name: &str) -> Result<Queue> {
    if name.trim().is_empty() {
        return Err(Rejection::QueueNameMissing.into());
    }
    app.store
        .queue_by_name(group, name.trim())
        .await?
        .ok_or_else(|| Rejection::QueueNotFound(name.trim().to_string()).into())
}

pub(crate) async fn create_queue(
    app: &App,
    group: ChatId,
    creator: UserId,
    raw_name: &str,
) -> Result<Queue> {
    let name = validate_queue_name(raw_name, app.cfg.max_queue_name_len)?;
    let existing = app.store.queues_in_group(group).await?;
    if existing.len() >= app.cfg.max_queues_per_chat {
        return Err(Rejection::TooManyQueues(app.cfg.max_queues_per_chat).into());
    }
    let queue = app
        .store
        .create_queue(NewQueue {
            group_id: group,
            name,
            creator_id: creator,
        })
        .await?;
    tracing::info!(queue_id = queue.id.0, chat_id = group.0, name = %queue.name, "queue created");
    Ok(queue)
}

/// Add `user` to the queue and return the queue as it is afterwards plus the
/// user's final position.
///
/// An automatic placement that loses a race for its position is re-planned once.
pub(crate) async fn enqueue(
    app: &App,
    queue_id: QueueId,
    user: UserId,
    requested: Option<u32>,
) -> Result<(Queue, u32)> {
    let mut retried = false;
    loop {
        let queue = app.load_queue(queue_id).await?;
        let position =
            positions::plan_enqueue(&queue, user, requested, app.cfg.max_queue_members)?;

        match app.store.add_member(queue.id, user, position).await {
            Ok(true) => break,
            Ok(false) => return Err(Rejection::QueueDeleted.into()),
            Err(Error::Conflict(Conflict::PositionReserved(p))) if requested.is_none() && !retried => {
                tracing::debug!(queue_id = queue_id.0, position = p, "position taken concurrently, re-planning");
                retried = true;
            }
            Err(e) => return Err(e),
        }
    }

    let queue = app.load_queue(queue_id).await?;
    if queue.is_dynamic {
        app.store.compress(queue_id, 1).await?;
    }
    let queue = app.load_queue(queue_id).await?;
    let position = queue
        .position_of(user)
        .ok_or_else(|| Error::Storage("member vanished right after enqueue".to_string()))?;
    tracing::debug!(queue_id = queue_id.0, user_id = user.0, position, "enqueued");
    Ok((queue, position))
}

/// Remove `user` and close the gap they leave behind.
pub(crate) async fn dequeue(app: &App, queue_id: QueueId, user: UserId) -> Result<Queue> {
    let queue = app.load_queue(queue_id).await?;
    let Some(vacated) = app.store.remove_member(queue_id, user).await? else {
        return Err(Rejection::NotParticipating.into());
    };
    let starting_at = if queue.is_dynamic { 1 } else { vacated };
    app.store.compress(queue_id, starting_at).await?;
    tracing::debug!(queue_id = queue_id.0, user_id = user.0, vacated, "dequeued");
    app.load_queue(queue_id).await
}

pub(crate) async fn remove_queue(app: &App, queue: &Queue, user: UserId) -> Result<()> {
    if !app.can_manage(queue, user).await? {
        return Err(Rejection::NoRights.into());
    }
    if !app.store.delete_queue(queue.id).await? {
        return Err(Rejection::QueueDeleted.into());
    }
    tracing::info!(queue_id = queue.id.0, user_id = user.0, "queue removed");
    Ok(())
}

/// Flip the dynamic flag; turning it on closes every gap.
pub(crate) async fn toggle_dynamic(app: &App, queue: &Queue, user: UserId) -> Result<Queue> {
    if !app.can_manage(queue, user).await? {
        return Err(Rejection::NoRights.into());
    }
    let is_dynamic = !queue.is_dynamic;
    if !app.store.set_dynamic(queue.id, is_dynamic).await? {
        return Err(Rejection::QueueDeleted.into());
    }
    if is_dynamic {
        app.store.compress(queue.id, 1).await?;
    }
    app.load_queue(queue.id).await
}
