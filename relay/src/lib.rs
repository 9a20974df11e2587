//! hello-relay - Telegram webhook relay that greets senders by name.
//!
//! This library provides shared modules for the three binaries:
//! - `hello-relay`: Web server receiving webhook updates and replying
//! - `hello-relay-webhook`: Registers or removes the webhook with Telegram
//! - `hello-relay-status`: End-to-end operational checks
//!
//! ## Flow
//!
//! ```text
//! Telegram → POST /webhook → greeting → (background) sendMessage → Telegram
//! ```

pub mod config;
pub mod greeting;
pub mod registrar;
pub mod status;
pub mod telegram;
pub mod web;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use greeting::build_greeting;
pub use registrar::{webhook_url, Registrar, RegistrarError};
pub use status::{Check, StatusChecker};
pub use telegram::{ReplySender, TelegramClient, TelegramError, Update};
pub use web::AppState;
