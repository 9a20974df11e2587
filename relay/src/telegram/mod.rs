//! Telegram Bot API types and client.

pub mod client;
pub mod types;

pub use client::{ReplySender, TelegramClient, TelegramError};
pub use types::{
    ApiResponse, Chat, Message, SetWebhookRequest, Update, User, WebhookInfo, ALLOWED_UPDATES,
};
