//! Entry point for every incoming update.
//!
//! The dispatcher records who was seen where, routes the update, and turns the
//! outcome into exactly one user-visible reaction. It never fails: internal
//! errors are logged and reported to the user and the operator chat.

use crate::{
    callback::CallbackToken,
    domain::{ChatInfo, UserInfo},
    errors::Error,
    formatting::{escape_html, strip_tags},
    handlers::{build_routers, App},
    messaging::types::{CallbackQuery, CommandMessage, IncomingUpdate},
    routing::{CallbackContext, CallbackRouter, CommandRouter, Notice},
    texts::MessageKey,
    Result,
};

pub struct UpdateDispatcher {
    app: App,
    commands: CommandRouter,
    callbacks: CallbackRouter,
}

impl UpdateDispatcher {
    pub fn new(app: App) -> Result<Self> {
        let (commands, callbacks) = build_routers()?;
        Ok(Self {
            app,
            commands,
            callbacks,
        })
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub async fn handle(&self, update: IncomingUpdate) {
        match update {
            IncomingUpdate::Command(msg) => self.handle_command(&msg).await,
            IncomingUpdate::Callback(query) => self.handle_callback(query).await,
        }
    }

    async fn handle_command(&self, msg: &CommandMessage) {
        if let Some(bot) = self.app.cfg.bot_username.as_deref() {
            if !msg.command.is_for(bot) {
                tracing::debug!(command = %msg.command.name, "command addressed to another bot");
                return;
            }
        }
        tracing::debug!(
            chat_id = msg.chat.id.0,
            user_id = msg.from.id.0,
            command = %msg.command.name,
            "command received"
        );

        let outcome = match self.observe(&msg.from, Some(&msg.chat)).await {
            Ok(()) => self.commands.dispatch(&self.app, msg).await.map(|_| ()),
            Err(e) => Err(e),
        };
        let Err(err) = outcome else {
            return;
        };

        if let Some(rejection) = err.rejection() {
            let html = rejection.render(self.app.texts.as_ref());
            if let Err(e) = self.app.send(msg.chat.id, &html, None).await {
                tracing::warn!(chat_id = msg.chat.id.0, error = %e, "failed to deliver rejection");
            }
            return;
        }
        if matches!(err, Error::MessageNotModified) {
            return;
        }

        let what = format!("command {}", msg.command.name);
        tracing::error!(chat_id = msg.chat.id.0, user_id = msg.from.id.0, error = %err, "{what} failed");
        let html = self.app.text(MessageKey::InternalError, &[]);
        if let Err(e) = self.app.send(msg.chat.id, &html, None).await {
            tracing::warn!(chat_id = msg.chat.id.0, error = %e, "failed to deliver error notice");
        }
        self.notify_operator(&what, &err).await;
    }

    async fn handle_callback(&self, query: CallbackQuery) {
        let token = match CallbackToken::decode(&query.data) {
            Ok(token) => token,
            Err(_) => {
                tracing::debug!(data = %query.data, "undecodable callback data");
                let text = self.app.text(MessageKey::Outdated, &[]);
                self.answer(&query.callback_id, Some(strip_tags(&text))).await;
                return;
            }
        };
        tracing::debug!(user_id = query.from.id.0, command = %token.command, "callback received");

        let ctx = CallbackContext {
            callback_id: query.callback_id,
            from: query.from,
            chat: query.chat,
            message: query.message,
            token,
        };

        let outcome = match self.observe(&ctx.from, ctx.chat.as_ref()).await {
            Ok(()) => self.callbacks.dispatch(&self.app, &ctx).await,
            Err(e) => Some(Err(e)),
        };

        let text = match outcome {
            None | Some(Ok(None)) | Some(Err(Error::MessageNotModified)) => None,
            Some(Ok(Some(notice))) => Some(self.render_notice(&notice)),
            Some(Err(err)) => match err.rejection() {
                Some(rejection) => Some(strip_tags(&rejection.render(self.app.texts.as_ref()))),
                None => {
                    let what = format!("callback {}", ctx.token.command);
                    tracing::error!(user_id = ctx.from.id.0, error = %err, "{what} failed");
                    self.notify_operator(&what, &err).await;
                    Some(strip_tags(&self.app.text(MessageKey::InternalError, &[])))
                }
            },
        };
        self.answer(&ctx.callback_id, text).await;
    }

    /// Record the sender, and the group when the update comes from one.
    async fn observe(&self, from: &UserInfo, chat: Option<&ChatInfo>) -> Result<()> {
        self.app.store.observe_user(from).await?;
        if let Some(chat) = chat.filter(|c| !c.is_private) {
            self.app.store.observe_group(chat, from.id).await?;
        }
        Ok(())
    }

    fn render_notice(&self, notice: &Notice) -> String {
        let params: Vec<String> = notice.params.iter().map(|p| escape_html(p)).collect();
        let params: Vec<&str> = params.iter().map(String::as_str).collect();
        strip_tags(&self.app.text(notice.key, &params))
    }

    async fn answer(&self, callback_id: &str, text: Option<String>) {
        if let Err(e) = self
            .app
            .transport
            .answer_callback(callback_id, text.as_deref())
            .await
        {
            tracing::warn!(callback_id, error = %e, "failed to answer callback");
        }
    }

    async fn notify_operator(&self, what: &str, err: &Error) {
        let Some(chat) = self.app.cfg.operator_chat_id else {
            return;
        };
        let html = self.app.text(
            MessageKey::OperatorInternalError,
            &[&escape_html(what), &escape_html(&err.to_string())],
        );
        if let Err(e) = self.app.send(chat, &html, None).await {
            tracing::warn!(chat_id = chat.0, error = %e, "failed to notify operator");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        callback::codes,
        domain::{ChatId, QueueId, UserId},
        testing::{
            callback_query, command_message, raw_callback_query, test_app, tokens, FakeTransport,
        },
    };
    use std::sync::Arc;

    fn dispatcher(transport: FakeTransport) -> (UpdateDispatcher, Arc<FakeTransport>) {
        let (app, t) = test_app(transport);
        (UpdateDispatcher::new(app).unwrap(), t)
    }

    async fn command(d: &UpdateDispatcher, chat: i64, user: i64, text: &str) {
        d.handle(IncomingUpdate::Command(command_message(chat, user, text)))
            .await;
    }

    #[tokio::test]
    async fn create_then_enqueue_twice() {
        let (d, t) = dispatcher(FakeTransport::new());

        command(&d, -1, 1, "/createqueue Snacks").await;
        assert!(t.sent_to(-1).last().unwrap().html.contains("Queue <b>Snacks</b> created."));

        command(&d, -1, 1, "/enqueue Snacks").await;
        assert_eq!(
            t.sent_to(-1).last().unwrap().html,
            "You joined <b>Snacks</b> at position 1."
        );

        command(&d, -1, 1, "/enqueue snacks").await;
        assert_eq!(
            t.sent_to(-1).last().unwrap().html,
            "You already participate in this queue."
        );
    }

    #[tokio::test]
    async fn commands_for_other_bots_are_ignored() {
        let (d, t) = dispatcher(FakeTransport::new());
        command(&d, -1, 1, "/createqueue@other_bot Snacks").await;
        assert!(t.sent().is_empty());

        command(&d, -1, 1, "/createqueue@Queue_Bot Snacks").await;
        assert_eq!(t.sent().len(), 1);
    }

    #[tokio::test]
    async fn group_only_commands_reject_private_chats() {
        let (d, t) = dispatcher(FakeTransport::new());
        command(&d, 5, 5, "/queue").await;
        assert_eq!(
            t.sent_to(5).last().unwrap().html,
            "This command works in group chats only."
        );
    }

    #[tokio::test]
    async fn private_start_opens_the_chat_list() {
        let (d, t) = dispatcher(FakeTransport::new());
        command(&d, -1, 5, "/help").await;
        command(&d, 5, 5, "/start").await;

        let start = t.sent_to(5).pop().unwrap();
        let lc = tokens(start.keyboard.as_ref().unwrap()).pop().unwrap();
        d.handle(IncomingUpdate::Callback(callback_query(5, 5, start.msg.message_id.0, &lc)))
            .await;

        let listing = t.edits().pop().unwrap();
        assert!(tokens(listing.keyboard.as_ref().unwrap())
            .iter()
            .any(|t| t.command == codes::GET_CHAT && t.chat_id == Some(ChatId(-1))));
        assert_eq!(t.answers().len(), 1);
    }

    #[tokio::test]
    async fn garbage_callback_data_is_outdated() {
        let (d, t) = dispatcher(FakeTransport::new());
        d.handle(IncomingUpdate::Callback(raw_callback_query(-1, 1, 3, "{\"c\":\"gq\",\"zz\":1}")))
            .await;
        d.handle(IncomingUpdate::Callback(raw_callback_query(-1, 1, 4, "not json")))
            .await;

        let answers = t.answers();
        assert_eq!(answers.len(), 2);
        for (_, text) in answers {
            assert_eq!(
                text.as_deref(),
                Some("This message is outdated, please use a current button or command.")
            );
        }
    }

    #[tokio::test]
    async fn callback_notices_are_plain_text() {
        let (d, t) = dispatcher(FakeTransport::new());
        command(&d, -1, 1, "/createqueue Tea & Cake").await;
        let created = t.sent_to(-1).pop().unwrap();
        let gq = tokens(created.keyboard.as_ref().unwrap()).pop().unwrap();

        let em = gq.retarget(codes::ENQUEUE_ME);
        d.handle(IncomingUpdate::Callback(callback_query(-1, 2, created.msg.message_id.0, &em)))
            .await;
        assert_eq!(
            t.last_answer_text().as_deref(),
            Some("You joined Tea & Cake at position 1.")
        );

        d.handle(IncomingUpdate::Callback(callback_query(-1, 2, created.msg.message_id.0, &em)))
            .await;
        assert_eq!(
            t.last_answer_text().as_deref(),
            Some("You already participate in this queue.")
        );
    }

    #[tokio::test]
    async fn unchanged_refresh_is_answered_without_notice() {
        let (d, t) = dispatcher(FakeTransport::new());
        command(&d, -1, 1, "/createqueue Snacks").await;
        let created = t.sent_to(-1).pop().unwrap();
        let gq = tokens(created.keyboard.as_ref().unwrap()).pop().unwrap();
        assert_eq!(gq.command, codes::GET_QUEUE);

        for _ in 0..2 {
            d.handle(IncomingUpdate::Callback(callback_query(-1, 1, created.msg.message_id.0, &gq)))
                .await;
        }

        assert_eq!(t.edits().len(), 1);
        let answers = t.answers();
        assert_eq!(answers.len(), 2);
        assert!(answers.iter().all(|(_, text)| text.is_none()));
        assert_eq!(t.sent_to(-1).len(), 1);
    }

    #[tokio::test]
    async fn unknown_and_deleted_targets_still_answer_once() {
        let (d, t) = dispatcher(FakeTransport::new());
        let unknown = CallbackToken::new("zz");
        d.handle(IncomingUpdate::Callback(callback_query(-1, 1, 3, &unknown)))
            .await;
        let deleted = CallbackToken::new(codes::GET_QUEUE).with_queue(QueueId(404));
        d.handle(IncomingUpdate::Callback(callback_query(-1, 1, 4, &deleted)))
            .await;

        let answers = t.answers();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].1, None);
        assert_eq!(answers[1].1.as_deref(), Some("This queue has been deleted."));
    }

    #[tokio::test]
    async fn internal_errors_reach_the_operator() {
        let (mut app, t) = test_app(FakeTransport::new().unreachable(-1));
        let mut cfg = (*app.cfg).clone();
        cfg.operator_chat_id = Some(ChatId(500));
        app.cfg = Arc::new(cfg);
        let d = UpdateDispatcher::new(app).unwrap();

        command(&d, -1, 1, "/createqueue Snacks").await;
        let report = t.sent_to(500).pop().unwrap();
        assert!(report.html.contains("command /createqueue"));
        assert!(d.app().store.queue_by_name(ChatId(-1), "Snacks").await.unwrap().is_some());
        assert!(d.app().store.user(UserId(1)).await.unwrap().is_some());
    }
}
