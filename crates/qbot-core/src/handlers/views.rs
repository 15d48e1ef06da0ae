//! Text + keyboard for every screen the bot shows.

use crate::{
    callback::{codes, CallbackToken},
    domain::{ChatId, Group, Queue, User, UserId},
    formatting::{escape_html, truncate_label},
    keyboard::{self, KeyboardBuilder},
    messaging::types::InlineKeyboard,
    pagination::{self, attach_page_controls},
    positions,
    swap,
    texts::MessageKey,
    Result,
};

use super::App;

pub(crate) struct View {
    pub html: String,
    pub keyboard: InlineKeyboard,
}

/// Positions offered per row of the position picker.
const POSITIONS_PER_ROW: usize = 5;

async fn member_users(app: &App, queue: &Queue) -> Result<Vec<(u32, User)>> {
    let mut out = Vec::with_capacity(queue.members.len());
    for m in &queue.members {
        out.push((m.position, app.user(m.user_id).await?));
    }
    Ok(out)
}

fn page_of<T>(items: &[T], page: usize, size: usize) -> &[T] {
    pagination::page(items, page, size).unwrap_or(&[])
}

/// Groups `user` has been seen in.
pub(crate) async fn chats(app: &App, user: UserId, page: usize) -> Result<View> {
    let groups: Vec<Group> = app.store.groups_of_user(user).await?;
    let size = app.cfg.page_size;
    let origin = CallbackToken::new(codes::LIST_CHATS);

    let html = if groups.is_empty() {
        app.text(MessageKey::NoChats, &[])
    } else {
        app.text(MessageKey::ChatsHeader, &[])
    };

    let mut kb = KeyboardBuilder::new();
    for g in page_of(&groups, page, size) {
        kb.row(
            truncate_label(&g.title, app.cfg.button_label_max_length),
            &CallbackToken::new(codes::GET_CHAT).with_chat(g.id),
        );
    }
    let has_next = page < pagination::page_count(groups.len(), size);
    attach_page_controls(&mut kb, app.texts.as_ref(), &origin, page, has_next);

    Ok(View {
        html,
        keyboard: kb.build(),
    })
}

/// Queues of one group. `in_private` adds the way back to the chat list.
pub(crate) async fn chat_queues(
    app: &App,
    group: &Group,
    page: usize,
    in_private: bool,
) -> Result<View> {
    let queues = app.store.queues_in_group(group.id).await?;
    let size = app.cfg.page_size;
    let origin = CallbackToken::new(codes::GET_CHAT).with_chat(group.id);

    let mut html = app.text(MessageKey::ChatQueuesHeader, &[&escape_html(&group.title)]);
    if queues.is_empty() {
        html.push_str("\n\n");
        html.push_str(&app.text(MessageKey::NoQueues, &[]));
    }

    let mut kb = KeyboardBuilder::new();
    for q in page_of(&queues, page, size) {
        kb.row(
            truncate_label(&q.name, app.cfg.button_label_max_length),
            &CallbackToken::new(codes::GET_QUEUE).with_queue(q.id),
        );
    }
    let has_next = page < pagination::page_count(queues.len(), size);
    attach_page_controls(&mut kb, app.texts.as_ref(), &origin, page, has_next);
    if in_private {
        keyboard::back_to_chats(&mut kb, app.texts.as_ref());
    }

    Ok(View {
        html,
        keyboard: kb.build(),
    })
}

/// Member list plus every action on the queue; handlers validate the presser.
pub(crate) async fn queue(app: &App, queue: &Queue) -> Result<View> {
    let mode = if queue.is_dynamic {
        app.text(MessageKey::ModeDynamic, &[])
    } else {
        app.text(MessageKey::ModeStatic, &[])
    };
    let mut html = app.text(MessageKey::QueueHeader, &[&escape_html(&queue.name), &mode]);
    html.push_str("\n\n");

    let members = member_users(app, queue).await?;
    if members.is_empty() {
        html.push_str(&app.text(MessageKey::QueueEmpty, &[]));
    } else {
        let lines: Vec<String> = members
            .iter()
            .map(|(pos, user)| {
                app.text(
                    MessageKey::QueueMemberLine,
                    &[&pos.to_string(), &escape_html(&user.display_name())],
                )
            })
            .collect();
        html.push_str(&lines.join("\n"));
    }

    let q = CallbackToken::new(codes::GET_QUEUE).with_queue(queue.id);
    let texts = app.texts.as_ref();
    let mut kb = KeyboardBuilder::new();
    kb.button(texts.message(MessageKey::BtnEnqueueMe, &[]), &q.retarget(codes::ENQUEUE_ME));
    if !queue.is_dynamic {
        kb.button(
            texts.message(MessageKey::BtnChoosePosition, &[]),
            &q.retarget(codes::ENQUEUE),
        );
    }
    kb.end_row();
    kb.button(texts.message(MessageKey::BtnDequeueMe, &[]), &q.retarget(codes::DEQUEUE_ME));
    kb.button(
        texts.message(MessageKey::BtnExchange, &[]),
        &swap::pick_target_token(queue.id),
    );
    kb.end_row();
    let switch_label = if queue.is_dynamic {
        MessageKey::BtnMakeStatic
    } else {
        MessageKey::BtnMakeDynamic
    };
    kb.button(texts.message(switch_label, &[]), &q.retarget(codes::SWITCH_QUEUE_DYNAMIC));
    keyboard::remove_queue_button(&mut kb, texts, queue.id);
    kb.end_row();
    kb.row(texts.message(MessageKey::BtnRefresh, &[]), &q);
    keyboard::back_to_chat(&mut kb, texts, queue.group_id);

    Ok(View {
        html,
        keyboard: kb.build(),
    })
}

/// Free positions up to the member limit. Pages past the end show the last page.
pub(crate) fn position_picker(app: &App, queue: &Queue, page: usize) -> View {
    let size = app.cfg.page_size * POSITIONS_PER_ROW;
    let capacity = u32::try_from(app.cfg.max_queue_members).unwrap_or(u32::MAX);
    let occupied = queue.occupied();
    let free = app.cfg.max_queue_members.saturating_sub(occupied.len());
    let offered: Vec<u32> = positions::available_positions(&occupied, free)
        .into_iter()
        .filter(|p| *p <= capacity)
        .collect();
    let page = page.clamp(1, pagination::page_count(offered.len(), size).max(1));
    let origin = CallbackToken::new(codes::ENQUEUE).with_queue(queue.id);

    let mut kb = KeyboardBuilder::new();
    for chunk in page_of(&offered, page, size).chunks(POSITIONS_PER_ROW) {
        for &p in chunk {
            kb.button(
                app.text(MessageKey::BtnPosition, &[&p.to_string()]),
                &CallbackToken::new(codes::ENQUEUE_AT)
                    .with_queue(queue.id)
                    .with_position(p),
            );
        }
        kb.end_row();
    }
    let has_next = page < pagination::page_count(offered.len(), size);
    attach_page_controls(&mut kb, app.texts.as_ref(), &origin, page, has_next);
    keyboard::back_to_queue(&mut kb, app.texts.as_ref(), queue.id);

    View {
        html: app.text(MessageKey::ChoosePosition, &[&escape_html(&queue.name)]),
        keyboard: kb.build(),
    }
}

/// Other members the requester can propose an exchange to.
pub(crate) async fn swap_targets(
    app: &App,
    queue: &Queue,
    requester: UserId,
    requester_position: u32,
    page: usize,
) -> Result<View> {
    let others: Vec<(u32, User)> = member_users(app, queue)
        .await?
        .into_iter()
        .filter(|(_, u)| u.id != requester)
        .collect();
    let size = app.cfg.page_size;

    let mut html = app.text(
        MessageKey::ChooseSwapTarget,
        &[&escape_html(&queue.name), &requester_position.to_string()],
    );
    if others.is_empty() {
        html.push_str("\n\n");
        html.push_str(&app.text(MessageKey::NoSwapTargets, &[]));
    }

    let mut kb = KeyboardBuilder::new();
    for (pos, user) in page_of(&others, page, size) {
        let label = app.text(
            MessageKey::QueueMemberLine,
            &[&pos.to_string(), &user.display_name()],
        );
        kb.row(
            truncate_label(&label, app.cfg.button_label_max_length),
            &swap::proposal_token(queue.id, user.id, requester_position),
        );
    }
    let has_next = page < pagination::page_count(others.len(), size);
    attach_page_controls(
        &mut kb,
        app.texts.as_ref(),
        &swap::pick_target_token(queue.id),
        page,
        has_next,
    );
    keyboard::back_to_queue(&mut kb, app.texts.as_ref(), queue.id);

    Ok(View { html, keyboard: kb.build() })
}

/// Confirmation screen for queue removal.
pub(crate) fn confirm_remove(app: &App, queue: &Queue) -> View {
    let token = CallbackToken::new(codes::REMOVE_QUEUE).with_queue(queue.id);
    let mut kb = KeyboardBuilder::new();
    kb.button(app.text(MessageKey::BtnYes, &[]), &token.clone().with_agreement(true));
    kb.button(app.text(MessageKey::BtnNo, &[]), &token.with_agreement(false));
    View {
        html: app.text(MessageKey::ConfirmRemoveQueue, &[&escape_html(&queue.name)]),
        keyboard: kb.build(),
    }
}

/// Shown in place of a removed queue.
pub(crate) fn queue_removed(app: &App, name: &str, group: ChatId) -> View {
    let mut kb = KeyboardBuilder::new();
    keyboard::back_to_chat(&mut kb, app.texts.as_ref(), group);
    View {
        html: app.text(MessageKey::QueueRemoved, &[&escape_html(name)]),
        keyboard: kb.build(),
    }
}
