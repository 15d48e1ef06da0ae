//! Command and callback routing tables.
//!
//! Both routers are built once in the composition root and are read-only
//! afterwards. An unknown key is not an error: `dispatch` reports it as
//! unhandled and the event is dropped.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    callback::CallbackToken,
    domain::{ChatInfo, MessageRef, UserInfo},
    errors::Error,
    handlers::App,
    messaging::types::CommandMessage,
    texts::MessageKey,
    Result,
};

/// A transient notice shown when a callback is answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub key: MessageKey,
    pub params: Vec<String>,
}

impl Notice {
    pub fn new(key: MessageKey) -> Self {
        Self {
            key,
            params: Vec::new(),
        }
    }

    pub fn with(key: MessageKey, params: Vec<String>) -> Self {
        Self { key, params }
    }
}

/// Everything a callback handler learns about the button press.
#[derive(Clone, Debug)]
pub struct CallbackContext {
    pub callback_id: String,
    pub from: UserInfo,
    pub chat: Option<ChatInfo>,
    pub message: Option<MessageRef>,
    pub token: CallbackToken,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, app: &App, msg: &CommandMessage) -> Result<()>;
}

#[async_trait]
pub trait CallbackHandler: Send + Sync {
    /// `Ok(Some(notice))` is shown to the presser when the callback is answered.
    async fn handle(&self, app: &App, ctx: &CallbackContext) -> Result<Option<Notice>>;
}

/// Exact-match table from key to handler.
pub struct Router<H: ?Sized> {
    kind: &'static str,
    handlers: HashMap<String, Arc<H>>,
    normalize: fn(&str) -> String,
}

impl<H: ?Sized> Router<H> {
    fn with_normalizer(kind: &'static str, normalize: fn(&str) -> String) -> Self {
        Self {
            kind,
            handlers: HashMap::new(),
            normalize,
        }
    }

    /// Register `handler` under `key`. Registering a key twice is a configuration error.
    pub fn register(&mut self, key: &str, handler: Arc<H>) -> Result<()> {
        let key = (self.normalize)(key);
        if self.handlers.contains_key(&key) {
            return Err(Error::Config(format!(
                "duplicate {} handler for {key:?}",
                self.kind
            )));
        }
        self.handlers.insert(key, handler);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Arc<H>> {
        self.handlers.get(&(self.normalize)(key)).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

pub type CommandRouter = Router<dyn CommandHandler>;
pub type CallbackRouter = Router<dyn CallbackHandler>;

impl Router<dyn CommandHandler> {
    /// Commands are user-typed, so keys are case-insensitive.
    pub fn new() -> Self {
        Self::with_normalizer("command", |key: &str| key.to_lowercase())
    }

    /// Returns `Ok(false)` when no handler is registered for the command.
    pub async fn dispatch(&self, app: &App, msg: &CommandMessage) -> Result<bool> {
        let Some(handler) = self.get(&msg.command.name) else {
            tracing::debug!(command = %msg.command.name, "no handler for command");
            return Ok(false);
        };
        handler.handle(app, msg).await?;
        Ok(true)
    }
}

impl Default for Router<dyn CommandHandler> {
    fn default() -> Self {
        Self::new()
    }
}

impl Router<dyn CallbackHandler> {
    /// Callback codes are machine-generated and matched exactly.
    pub fn new() -> Self {
        Self::with_normalizer("callback", |key: &str| key.to_string())
    }

    /// `None` when no handler is registered for the token's command.
    pub async fn dispatch(
        &self,
        app: &App,
        ctx: &CallbackContext,
    ) -> Option<Result<Option<Notice>>> {
        let Some(handler) = self.get(&ctx.token.command) else {
            tracing::debug!(command = %ctx.token.command, "no handler for callback");
            return None;
        };
        Some(handler.handle(app, ctx).await)
    }
}

impl Default for Router<dyn CallbackHandler> {
    fn default() -> Self {
        Self::new()
    }
}
