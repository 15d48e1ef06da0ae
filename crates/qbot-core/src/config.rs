use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::ChatId, errors::Error, Result};

/// Typed configuration for the bot, loaded from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    /// Used to strip `@mention` suffixes; learned from `getMe` when unset.
    pub bot_username: Option<String>,
    /// Chat that receives "something went wrong" notices.
    pub operator_chat_id: Option<ChatId>,
    /// JSON snapshot of the in-memory store. `None` keeps state in memory only.
    pub store_file: Option<PathBuf>,

    // Limits
    pub page_size: usize,
    pub max_queue_name_len: usize,
    pub max_queue_members: usize,
    pub max_queues_per_chat: usize,
    pub button_label_max_length: usize,

    // Outbound throttling
    pub throttle_global_interval: Duration,
    pub throttle_per_chat_interval: Duration,
}

impl Config {
    /// Defaults for everything except the token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            telegram_bot_token: token.into(),
            bot_username: None,
            operator_chat_id: None,
            store_file: None,
            page_size: 5,
            max_queue_name_len: 32,
            max_queue_members: 100,
            max_queues_per_chat: 20,
            button_label_max_length: 30,
            throttle_global_interval: Duration::from_millis(40),
            throttle_per_chat_interval: Duration::from_millis(1050),
        }
    }

    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (env in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let mut cfg = Self::with_token(token.trim());

        cfg.bot_username = lookup("BOT_USERNAME")
            .and_then(non_empty)
            .map(|s| s.trim_start_matches('@').to_string());
        cfg.operator_chat_id = parse_opt::<i64>(&lookup, "OPERATOR_CHAT_ID")?.map(ChatId);
        cfg.store_file = lookup("STORE_FILE").and_then(non_empty).map(PathBuf::from);

        if let Some(v) = parse_opt::<usize>(&lookup, "PAGE_SIZE")? {
            cfg.page_size = positive("PAGE_SIZE", v)?;
        }
        if let Some(v) = parse_opt::<usize>(&lookup, "MAX_QUEUE_NAME_LENGTH")? {
            cfg.max_queue_name_len = positive("MAX_QUEUE_NAME_LENGTH", v)?;
        }
        if let Some(v) = parse_opt::<usize>(&lookup, "MAX_QUEUE_MEMBERS")? {
            cfg.max_queue_members = positive("MAX_QUEUE_MEMBERS", v)?;
        }
        if let Some(v) = parse_opt::<usize>(&lookup, "MAX_QUEUES_PER_CHAT")? {
            cfg.max_queues_per_chat = positive("MAX_QUEUES_PER_CHAT", v)?;
        }
        if let Some(v) = parse_opt::<usize>(&lookup, "BUTTON_LABEL_MAX_LENGTH")? {
            cfg.button_label_max_length = positive("BUTTON_LABEL_MAX_LENGTH", v)?;
        }
        if let Some(ms) = parse_opt::<u64>(&lookup, "THROTTLE_GLOBAL_MS")? {
            cfg.throttle_global_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_opt::<u64>(&lookup, "THROTTLE_PER_CHAT_MS")? {
            cfg.throttle_per_chat_interval = Duration::from_millis(ms);
        }

        Ok(cfg)
    }
}

fn parse_opt<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw:?}")))
}

fn positive(key: &str, v: usize) -> Result<usize> {
    if v == 0 {
        return Err(Error::Config(format!("{key} must be greater than zero")));
    }
    Ok(v)
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
