//! Webhook registration against the provider.
//!
//! Both entry points are idempotent: setting the same URL twice is a no-op on
//! the provider side, and reset always ends in a freshly registered webhook.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::config::{Config, ConfigError};
use crate::telegram::{SetWebhookRequest, TelegramClient, TelegramError, WebhookInfo};

/// Path the receiver serves inbound updates on.
pub const WEBHOOK_PATH: &str = "/webhook";

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no public base url configured or derivable from the request")]
    MissingBaseUrl,

    #[error("invalid public base url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },

    #[error(transparent)]
    Telegram(#[from] TelegramError),
}

/// Public webhook URL for a base origin, e.g. `https://x.dev/` -> `https://x.dev/webhook`.
pub fn webhook_url(base: &str) -> Result<String, RegistrarError> {
    let trimmed = base.trim().trim_end_matches('/');

    let parsed = Url::parse(trimmed).map_err(|source| RegistrarError::InvalidBaseUrl {
        url: base.to_string(),
        source,
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RegistrarError::InvalidBaseUrl {
            url: base.to_string(),
            source: url::ParseError::RelativeUrlWithoutBase,
        });
    }

    Ok(format!("{}{}", trimmed, WEBHOOK_PATH))
}

/// Registers, removes and inspects the bot's webhook.
#[derive(Clone)]
pub struct Registrar {
    client: TelegramClient,
    secret: Option<String>,
}

impl Registrar {
    pub fn new(client: TelegramClient, secret: Option<String>) -> Self {
        Self { client, secret }
    }

    pub fn from_config(config: &Config) -> Result<Self, RegistrarError> {
        let client = TelegramClient::from_config(config)?;
        Ok(Self::new(client, config.webhook_secret.clone()))
    }

    /// Point the webhook at `{base}/webhook` with the shared secret and allow-list.
    pub async fn set(&self, base: &str) -> Result<Value, RegistrarError> {
        let url = webhook_url(base)?;
        if self.secret.is_none() {
            warn!("webhook_secret_not_configured");
        }

        let request = SetWebhookRequest::new(url.clone(), self.secret.clone());
        let result = self.client.set_webhook(&request).await?;

        info!(
            webhook_url = %url,
            secret_configured = self.secret.is_some(),
            "webhook_registered"
        );
        Ok(result)
    }

    pub async fn delete(&self) -> Result<Value, RegistrarError> {
        let result = self.client.delete_webhook(false).await?;
        info!("webhook_deleted");
        Ok(result)
    }

    /// Delete then set, forcing a clean registration state.
    pub async fn reset(&self, base: &str) -> Result<Value, RegistrarError> {
        // Validate before touching the provider so a bad URL never leaves us unregistered.
        webhook_url(base)?;
        self.delete().await?;
        self.set(base).await
    }

    pub async fn info(&self) -> Result<WebhookInfo, RegistrarError> {
        Ok(self.client.get_webhook_info().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubProvider;
    use serde_json::json;

    #[test]
    fn test_webhook_url() {
        assert_eq!(
            webhook_url("https://relay.example.com").unwrap(),
            "https://relay.example.com/webhook"
        );
        assert_eq!(
            webhook_url("https://relay.example.com//").unwrap(),
            "https://relay.example.com/webhook"
        );
        assert_eq!(
            webhook_url("http://localhost:8787/bot/").unwrap(),
            "http://localhost:8787/bot/webhook"
        );
    }

    #[test]
    fn test_webhook_url_invalid() {
        assert!(matches!(
            webhook_url("relay.example.com"),
            Err(RegistrarError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            webhook_url("ftp://relay.example.com"),
            Err(RegistrarError::InvalidBaseUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_reset_rejects_bad_url_before_calling_provider() {
        let registrar = Registrar::new(TelegramClient::new("http://127.0.0.1:9", "tok"), None);
        let err = registrar.reset("not a url").await.unwrap_err();
        assert!(matches!(err, RegistrarError::InvalidBaseUrl { .. }));
    }

    #[tokio::test]
    async fn test_reset_deletes_then_sets() {
        let stub = StubProvider::new();
        let registrar = Registrar::new(
            TelegramClient::new(stub.serve().await, "tok"),
            Some("S1".to_string()),
        );

        let result = registrar.reset("https://relay.example.com/").await.unwrap();

        assert_eq!(result, json!(true));
        let calls = stub.calls();
        assert_eq!(stub.methods(), vec!["deleteWebhook", "setWebhook"]);
        assert_eq!(
            calls[1].1,
            json!({
                "url": "https://relay.example.com/webhook",
                "secret_token": "S1",
                "allowed_updates": ["message", "edited_message"],
            })
        );
    }

    #[tokio::test]
    async fn test_reset_stops_when_delete_fails() {
        let stub = StubProvider::new();
        stub.respond(
            "deleteWebhook",
            500,
            json!({ "ok": false, "error_code": 500, "description": "Internal Server Error" }),
        );
        let registrar = Registrar::new(TelegramClient::new(stub.serve().await, "tok"), None);

        let err = registrar.reset("https://relay.example.com").await.unwrap_err();

        assert!(matches!(err, RegistrarError::Telegram(TelegramError::Api { status: 500, .. })));
        assert_eq!(stub.methods(), vec!["deleteWebhook"]);
    }

    #[tokio::test]
    async fn test_set_without_secret_omits_secret_token() {
        let stub = StubProvider::new();
        let registrar = Registrar::new(TelegramClient::new(stub.serve().await, "tok"), None);

        registrar.set("https://relay.example.com").await.unwrap();

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.get("secret_token").is_none());
    }

    #[tokio::test]
    async fn test_set_surfaces_transport_error() {
        let registrar = Registrar::new(
            TelegramClient::new("http://127.0.0.1:9", "tok"),
            Some("s".to_string()),
        );
        let err = registrar.set("https://relay.example.com").await.unwrap_err();
        assert!(matches!(err, RegistrarError::Telegram(TelegramError::Transport(_))));
    }
}
