use std::sync::Arc;

use qbot_core::{
    config::Config,
    store::{InMemoryStore, QueueStore},
};

#[tokio::main]
async fn main() -> Result<(), qbot_core::Error> {
    qbot_core::logging::init("qbot")?;

    let cfg = Config::load()?;
    let store: Arc<dyn QueueStore> = match &cfg.store_file {
        Some(path) => Arc::new(InMemoryStore::open(path).await?),
        None => {
            tracing::warn!("STORE_FILE not set; queues live in memory only");
            Arc::new(InMemoryStore::new())
        }
    };

    qbot_telegram::router::run_polling(cfg, store)
        .await
        .map_err(|e| qbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
