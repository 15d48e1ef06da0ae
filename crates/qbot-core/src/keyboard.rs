//! Inline keyboard construction.
//!
//! [`KeyboardBuilder`] accumulates rows; the free functions below attach the
//! recurring navigation buttons so each handler picks exactly the ones it needs.

use crate::{
    callback::{codes, CallbackToken},
    domain::{ChatId, QueueId},
    messaging::types::{InlineButton, InlineKeyboard},
    texts::{MessageKey, TextProvider},
};

#[derive(Debug, Default)]
pub struct KeyboardBuilder {
    rows: Vec<Vec<InlineButton>>,
    current: Vec<InlineButton>,
}

impl KeyboardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a button to the current row.
    pub fn button(&mut self, label: impl Into<String>, token: &CallbackToken) -> &mut Self {
        let callback_data = token.encode();
        if !token.fits_button() {
            tracing::warn!(
                len = callback_data.len(),
                command = %token.command,
                "callback token exceeds the button payload limit"
            );
        }
        self.current.push(InlineButton {
            label: label.into(),
            callback_data,
        });
        self
    }

    /// Close the current row (no-op when it is empty).
    pub fn end_row(&mut self) -> &mut Self {
        if !self.current.is_empty() {
            self.rows.push(std::mem::take(&mut self.current));
        }
        self
    }

    /// Add a button on a row of its own.
    pub fn row(&mut self, label: impl Into<String>, token: &CallbackToken) -> &mut Self {
        self.end_row().button(label, token).end_row()
    }

    pub fn build(mut self) -> InlineKeyboard {
        self.end_row();
        InlineKeyboard { rows: self.rows }
    }
}

pub fn back_to_chats(kb: &mut KeyboardBuilder, texts: &dyn TextProvider) {
    kb.row(
        texts.message(MessageKey::BtnBackToChats, &[]),
        &CallbackToken::new(codes::LIST_CHATS),
    );
}

pub fn back_to_chat(kb: &mut KeyboardBuilder, texts: &dyn TextProvider, chat_id: ChatId) {
    kb.row(
        texts.message(MessageKey::BtnBackToChat, &[]),
        &CallbackToken::new(codes::GET_CHAT).with_chat(chat_id),
    );
}

pub fn back_to_queue(kb: &mut KeyboardBuilder, texts: &dyn TextProvider, queue_id: QueueId) {
    kb.row(
        texts.message(MessageKey::BtnBackToQueue, &[]),
        &CallbackToken::new(codes::GET_QUEUE).with_queue(queue_id),
    );
}

pub fn remove_queue_button(kb: &mut KeyboardBuilder, texts: &dyn TextProvider, queue_id: QueueId) {
    kb.button(
        texts.message(MessageKey::BtnRemoveQueue, &[]),
        &CallbackToken::new(codes::REMOVE_QUEUE).with_queue(queue_id),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texts::EnglishTexts;

    #[test]
    fn groups_buttons_into_rows() {
        let t = CallbackToken::new("gq").with_queue(QueueId(1));
        let mut kb = KeyboardBuilder::new();
        kb.button("a", &t).button("b", &t).end_row().end_row();
        kb.row("c", &t);
        kb.button("d", &t);
        let built = kb.build();

        let labels: Vec<Vec<&str>> = built
            .rows
            .iter()
            .map(|r| r.iter().map(|b| b.label.as_str()).collect())
            .collect();
        assert_eq!(labels, vec![vec!["a", "b"], vec!["c"], vec!["d"]]);
        assert_eq!(built.rows[0][0].callback_data, r#"{"c":"gq","d":{"i":1}}"#);
    }

    #[test]
    fn navigation_buttons_carry_their_targets() {
        let mut kb = KeyboardBuilder::new();
        back_to_chat(&mut kb, &EnglishTexts, ChatId(-5));
        back_to_queue(&mut kb, &EnglishTexts, QueueId(7));
        let built = kb.build();

        let tokens: Vec<CallbackToken> = built
            .buttons()
            .map(|b| CallbackToken::decode(&b.callback_data).unwrap())
            .collect();
        assert_eq!(tokens[0], CallbackToken::new(codes::GET_CHAT).with_chat(ChatId(-5)));
        assert_eq!(tokens[1].queue_id(), Some(QueueId(7)));
        assert!(KeyboardBuilder::new().build().is_empty());
    }
}
