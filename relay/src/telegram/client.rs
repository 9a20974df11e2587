//! Async Bot API client.
//!
//! Every method is a JSON POST to `{api_base}/bot{token}/{method}`. The token
//! is part of the path, so request URLs are never logged.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use super::types::{ApiResponse, Message, SendMessageRequest, SetWebhookRequest, User, WebhookInfo};
use crate::config::{Config, ConfigError};

#[derive(Debug, Error)]
pub enum TelegramError {
    /// The request never produced a response (DNS, connect, timeout, ...)
    #[error("telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with `ok: false` or a non-success status
    #[error("telegram api error (status {status}): {}", .description.as_deref().unwrap_or("no description"))]
    Api {
        status: u16,
        description: Option<String>,
        data: Value,
    },
}

/// Sends the greeting reply. The returned future owns everything it needs,
/// so it can be spawned and outlive the request that scheduled it.
pub trait ReplySender: Send + Sync {
    fn send_reply(&self, chat_id: i64, text: String) -> BoxFuture<'static, Result<(), TelegramError>>;
}

/// Telegram Bot API client. Cheap to clone.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    /// Create a client without a request timeout.
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_http(Client::new(), api_base, token)
    }

    /// Create a client whose requests abort after `timeout`.
    pub fn with_timeout(
        api_base: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(http, api_base, token))
    }

    pub fn with_http(http: Client, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let token = config.require_token()?;
        Ok(Self::new(config.api_base.clone(), token))
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?;

        let data: Value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        let envelope: Option<ApiResponse<T>> = serde_json::from_value(data.clone()).ok();

        match envelope {
            Some(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) if (200..300).contains(&status) => {
                info!(method = method, status_code = status, "telegram_call_ok");
                Ok(result)
            }
            other => {
                let description = other.and_then(|e| e.description);
                error!(
                    method = method,
                    status_code = status,
                    description = ?description,
                    "telegram_call_rejected"
                );
                Err(TelegramError::Api {
                    status,
                    description,
                    data,
                })
            }
        }
    }

    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, TelegramError> {
        self.call("getWebhookInfo", &serde_json::json!({})).await
    }

    /// Register `url` as the webhook. The provider answers with `true`.
    pub async fn set_webhook(&self, request: &SetWebhookRequest) -> Result<Value, TelegramError> {
        self.call("setWebhook", request).await
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<Value, TelegramError> {
        self.call(
            "deleteWebhook",
            &serde_json::json!({ "drop_pending_updates": drop_pending_updates }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
        };
        self.call("sendMessage", &request).await
    }
}

impl ReplySender for TelegramClient {
    fn send_reply(&self, chat_id: i64, text: String) -> BoxFuture<'static, Result<(), TelegramError>> {
        let client = self.clone();
        Box::pin(async move {
            client.send_message(chat_id, &text).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubProvider;
    use serde_json::json;

    #[test]
    fn test_method_url() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:abc");
        assert_eq!(
            client.method_url("getMe"),
            "https://api.telegram.org/bot123:abc/getMe"
        );
    }

    #[test]
    fn test_from_config_requires_token() {
        let mut config = Config::from_source(&crate::config::EnvSource::from_contents(""));
        config.bot_token = None;
        assert!(TelegramClient::from_config(&config).is_err());

        config.bot_token = Some("tok".to_string());
        assert!(TelegramClient::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_ok_envelope_yields_result() {
        let stub = StubProvider::new();
        stub.respond(
            "getMe",
            200,
            json!({ "ok": true, "result": { "id": 99, "is_bot": true, "first_name": "Relay", "username": "relay_bot" } }),
        );
        let client = TelegramClient::new(stub.serve().await, "tok");

        let me = client.get_me().await.unwrap();

        assert_eq!(me.id, 99);
        assert_eq!(me.username.as_deref(), Some("relay_bot"));
        assert_eq!(stub.methods(), vec!["getMe"]);
    }

    #[tokio::test]
    async fn test_send_message_posts_chat_and_text() {
        let stub = StubProvider::new();
        stub.respond(
            "sendMessage",
            200,
            json!({ "ok": true, "result": { "message_id": 5, "date": 0, "chat": { "id": 42, "type": "private" } } }),
        );
        let client = TelegramClient::new(stub.serve().await, "tok");

        client.send_reply(42, "Hello @bob Bob".to_string()).await.unwrap();

        assert_eq!(
            stub.calls(),
            vec![("sendMessage".to_string(), json!({ "chat_id": 42, "text": "Hello @bob Bob" }))]
        );
    }

    #[tokio::test]
    async fn test_error_envelope_is_api_error() {
        let stub = StubProvider::new();
        stub.respond(
            "getMe",
            401,
            json!({ "ok": false, "error_code": 401, "description": "Unauthorized" }),
        );
        let client = TelegramClient::new(stub.serve().await, "tok");

        match client.get_me().await.unwrap_err() {
            TelegramError::Api {
                status,
                description,
                data,
            } => {
                assert_eq!(status, 401);
                assert_eq!(description.as_deref(), Some("Unauthorized"));
                assert_eq!(data["error_code"], 401);
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ok_false_with_success_status_is_api_error() {
        let stub = StubProvider::new();
        stub.respond("deleteWebhook", 200, json!({ "ok": false, "description": "nope" }));
        let client = TelegramClient::new(stub.serve().await, "tok");

        let err = client.delete_webhook(false).await.unwrap_err();
        assert!(matches!(err, TelegramError::Api { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_transport_error() {
        // Port 9 on loopback: nothing listens there, connect is refused.
        let client = TelegramClient::with_timeout(
            "http://127.0.0.1:9",
            "tok",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.get_me().await.unwrap_err();
        assert!(matches!(err, TelegramError::Transport(_)));
    }
}
