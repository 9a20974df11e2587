//! Telegram Bot API payload types.
//!
//! Only the fields the relay reads or writes are modelled; unknown fields
//! in inbound payloads are ignored.

use serde::{Deserialize, Serialize};

/// Update kinds the relay asks the provider to deliver.
pub const ALLOWED_UPDATES: &[&str] = &["message", "edited_message"];

// =============================================================================
// Inbound
// =============================================================================

/// Inbound event notification delivered to the webhook.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub edited_message: Option<Message>,
}

impl Update {
    /// The new message if present, otherwise the edited one.
    pub fn effective_message(&self) -> Option<&Message> {
        self.message.as_ref().or(self.edited_message.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub date: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

// =============================================================================
// Bot API envelopes and results
// =============================================================================

/// Envelope every Bot API method responds with.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

/// Result of `getWebhookInfo`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pending_update_count: i64,
    #[serde(default)]
    pub last_error_message: Option<String>,
    #[serde(default)]
    pub allowed_updates: Option<Vec<String>>,
}

// =============================================================================
// Outbound requests
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SetWebhookRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,
    pub allowed_updates: Vec<String>,
}

impl SetWebhookRequest {
    pub fn new(url: String, secret_token: Option<String>) -> Self {
        Self {
            url,
            secret_token,
            allowed_updates: ALLOWED_UPDATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
}
