//! Test doubles shared by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    callback::CallbackToken,
    command::parse_command,
    config::Config,
    domain::{ChatId, ChatInfo, MessageId, MessageRef, UserId, UserInfo},
    errors::Error,
    handlers::App,
    messaging::{
        port::ChatTransport,
        types::{CallbackQuery, CommandMessage, InlineKeyboard},
    },
    store::InMemoryStore,
    texts::EnglishTexts,
    Result,
};

#[derive(Clone, Debug)]
pub struct SentMessage {
    pub msg: MessageRef,
    pub html: String,
    pub keyboard: Option<InlineKeyboard>,
}

#[derive(Default)]
pub struct FakeTransport {
    next_id: Mutex<i32>,
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<SentMessage>>,
    answers: Mutex<Vec<(String, Option<String>)>>,
    admins: Mutex<HashMap<ChatId, Vec<UserId>>>,
    unreachable: Mutex<HashSet<ChatId>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1),
            ..Default::default()
        }
    }

    pub fn with_admins(self, chat: i64, admins: &[i64]) -> Self {
        self.admins
            .lock()
            .unwrap()
            .insert(ChatId(chat), admins.iter().copied().map(UserId).collect());
        self
    }

    /// Sends to `chat` fail, like a user who never started the bot.
    pub fn unreachable(self, chat: i64) -> Self {
        self.unreachable.lock().unwrap().insert(ChatId(chat));
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat: i64) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|s| s.msg.chat_id == ChatId(chat))
            .collect()
    }

    pub fn edits(&self) -> Vec<SentMessage> {
        self.edits.lock().unwrap().clone()
    }

    pub fn answers(&self) -> Vec<(String, Option<String>)> {
        self.answers.lock().unwrap().clone()
    }

    pub fn last_answer_text(&self) -> Option<String> {
        self.answers().last().and_then(|(_, t)| t.clone())
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        let id = *guard;
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(id),
        }
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        if self.unreachable.lock().unwrap().contains(&chat_id) {
            return Err(Error::External("Forbidden: bot can't initiate conversation".into()));
        }
        let msg = self.alloc(chat_id);
        self.sent.lock().unwrap().push(SentMessage {
            msg,
            html: html.to_string(),
            keyboard,
        });
        Ok(msg)
    }

    async fn edit_message(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        let mut edits = self.edits.lock().unwrap();
        let unchanged = edits
            .iter()
            .rev()
            .find(|e| e.msg == msg)
            .is_some_and(|e| e.html == html && e.keyboard == keyboard);
        if unchanged {
            return Err(Error::MessageNotModified);
        }
        edits.push(SentMessage {
            msg,
            html: html.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, notice: Option<&str>) -> Result<()> {
        self.answers
            .lock()
            .unwrap()
            .push((callback_id.to_string(), notice.map(str::to_string)));
        Ok(())
    }

    async fn chat_administrators(&self, chat_id: ChatId) -> Result<Vec<UserId>> {
        Ok(self
            .admins
            .lock()
            .unwrap()
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn test_config() -> Config {
    let mut cfg = Config::with_token("test-token");
    cfg.bot_username = Some("queue_bot".to_string());
    cfg.page_size = 3;
    cfg.max_queue_members = 10;
    cfg
}

pub fn test_app(transport: FakeTransport) -> (App, Arc<FakeTransport>) {
    let transport = Arc::new(transport);
    let app = App {
        cfg: Arc::new(test_config()),
        store: Arc::new(InMemoryStore::new()),
        transport: transport.clone(),
        texts: Arc::new(EnglishTexts),
    };
    (app, transport)
}

pub fn user_info(id: i64, first_name: &str) -> UserInfo {
    UserInfo {
        id: UserId(id),
        first_name: first_name.to_string(),
        last_name: None,
    }
}

/// Negative ids are groups, positive ids are private chats.
pub fn chat_info(id: i64) -> ChatInfo {
    ChatInfo {
        id: ChatId(id),
        title: (id < 0).then(|| format!("Group {}", -id)),
        is_private: id > 0,
    }
}

pub fn command_message(chat: i64, user: i64, text: &str) -> CommandMessage {
    CommandMessage {
        chat: chat_info(chat),
        from: user_info(user, &format!("User{user}")),
        message: MessageRef {
            chat_id: ChatId(chat),
            message_id: MessageId(1000),
        },
        command: parse_command(text).expect("test text must be a command"),
    }
}

pub fn callback_query(chat: i64, user: i64, message_id: i32, token: &CallbackToken) -> CallbackQuery {
    raw_callback_query(chat, user, message_id, &token.encode())
}

pub fn raw_callback_query(chat: i64, user: i64, message_id: i32, data: &str) -> CallbackQuery {
    CallbackQuery {
        callback_id: format!("cb-{user}-{message_id}"),
        from: user_info(user, &format!("User{user}")),
        chat: Some(chat_info(chat)),
        message: Some(MessageRef {
            chat_id: ChatId(chat),
            message_id: MessageId(message_id),
        }),
        data: data.to_string(),
    }
}

/// Decode every button of a keyboard.
pub fn tokens(keyboard: &InlineKeyboard) -> Vec<CallbackToken> {
    keyboard
        .buttons()
        .filter_map(|b| CallbackToken::decode(&b.callback_data).ok())
        .collect()
}
