use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use qbot_core::messaging::throttled::{ThrottleConfig, ThrottledTransport};
use qbot_core::{
    config::Config,
    dispatch::UpdateDispatcher,
    handlers::App,
    messaging::port::ChatTransport,
    store::QueueStore,
    texts::EnglishTexts,
};

use crate::handlers;
use crate::TelegramTransport;

pub async fn run_polling(cfg: Config, store: Arc<dyn QueueStore>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let mut cfg = cfg;
    match bot.get_me().await {
        Ok(me) => {
            tracing::info!(username = %me.username(), "queue bot started");
            if cfg.bot_username.is_none() {
                cfg.bot_username = Some(me.username().to_string());
            }
        }
        Err(e) => tracing::warn!(error = %e, "getMe failed; @mentions will not be filtered"),
    }
    let cfg = Arc::new(cfg);

    // Throttle outbound calls; the adapter still retries once on RetryAfter.
    let raw: Arc<dyn ChatTransport> = Arc::new(TelegramTransport::new(bot.clone()));
    let transport: Arc<dyn ChatTransport> =
        Arc::new(ThrottledTransport::new(raw, ThrottleConfig::from(cfg.as_ref())));

    let app = App {
        cfg,
        store,
        transport,
        texts: Arc::new(EnglishTexts),
    };
    let dispatcher = Arc::new(UpdateDispatcher::new(app)?);

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("queue bot stopped");
    Ok(())
}
