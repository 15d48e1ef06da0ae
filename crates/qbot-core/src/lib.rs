//! Core domain + application logic for the queue bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and storage live
//! behind ports (traits); adapter crates implement them.

pub mod callback;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod handlers;
pub mod keyboard;
pub mod logging;
pub mod messaging;
pub mod pagination;
pub mod positions;
pub mod routing;
pub mod store;
pub mod swap;
pub mod texts;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
