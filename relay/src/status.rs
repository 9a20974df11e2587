//! Operational status checks against the provider and the running service.
//!
//! Checks run one after another and never short-circuit: a failing check is
//! reported and the next one still runs.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, ConfigError};
use crate::registrar::{webhook_url, WEBHOOK_PATH};
use crate::telegram::TelegramClient;
use crate::web::SECRET_HEADER;

/// Every outbound call made by the checker aborts after this long.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum StatusError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl Check {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: false,
            detail: detail.into(),
        }
    }
}

pub fn all_passed(checks: &[Check]) -> bool {
    checks.iter().all(|c| c.ok)
}

pub struct StatusChecker {
    config: Config,
    base_url: Option<String>,
    telegram: TelegramClient,
    http: Client,
}

impl StatusChecker {
    /// `base_url` overrides `PUBLIC_BASE_URL` as the service origin to check.
    pub fn new(config: Config, base_url: Option<String>) -> Result<Self, StatusError> {
        let token = config.require_token()?.to_string();
        let http = Client::builder().timeout(CHECK_TIMEOUT).build()?;
        let telegram = TelegramClient::with_http(http.clone(), config.api_base.clone(), token);
        let base_url = base_url
            .or_else(|| config.public_base_url.clone())
            .map(|b| b.trim().trim_end_matches('/').to_string());

        Ok(Self {
            config,
            base_url,
            telegram,
            http,
        })
    }

    /// Run every check in order. The send check only runs when a test chat is configured.
    pub async fn run(&self) -> Vec<Check> {
        let mut checks = vec![
            self.check_auth().await,
            self.check_webhook().await,
            self.check_health().await,
            self.check_secret().await,
        ];

        if let Some(chat_id) = self.config.test_chat_id {
            checks.push(self.check_send(chat_id).await);
        }

        for check in &checks {
            if check.ok {
                info!(check = check.name, detail = %check.detail, "status_check_passed");
            } else {
                warn!(check = check.name, detail = %check.detail, "status_check_failed");
            }
        }

        checks
    }

    pub async fn check_auth(&self) -> Check {
        match self.telegram.get_me().await {
            Ok(me) => Check::pass(
                "auth",
                format!(
                    "authenticated as @{} (id {})",
                    me.username.as_deref().unwrap_or("?"),
                    me.id
                ),
            ),
            Err(e) => Check::fail("auth", e.to_string()),
        }
    }

    pub async fn check_webhook(&self) -> Check {
        let Some(base) = &self.base_url else {
            return Check::fail("webhook", "PUBLIC_BASE_URL not set, cannot compute expected url");
        };

        let expected = match webhook_url(base) {
            Ok(url) => url,
            Err(e) => return Check::fail("webhook", e.to_string()),
        };

        match self.telegram.get_webhook_info().await {
            Ok(info) if info.url == expected => {
                let mut detail = format!("registered at {}", info.url);
                if let Some(last_error) = info.last_error_message {
                    detail.push_str(&format!(" (last error: {})", last_error));
                }
                Check::pass("webhook", detail)
            }
            Ok(info) if info.url.is_empty() => Check::fail("webhook", "no webhook registered"),
            Ok(info) => Check::fail(
                "webhook",
                format!("registered at {}, expected {}", info.url, expected),
            ),
            Err(e) => Check::fail("webhook", e.to_string()),
        }
    }

    pub async fn check_health(&self) -> Check {
        let Some(base) = &self.base_url else {
            return Check::fail("health", "PUBLIC_BASE_URL not set");
        };

        let resp = match self.http.get(format!("{}/", base)).send().await {
            Ok(resp) => resp,
            Err(e) => return Check::fail("health", describe(&e)),
        };

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if status == StatusCode::OK && body.trim() == "OK" {
            Check::pass("health", "GET / returned 200 OK")
        } else {
            Check::fail("health", format!("GET / returned {} {:?}", status.as_u16(), body))
        }
    }

    /// The correct secret must be accepted and a wrong one rejected with 401.
    ///
    /// Without a configured secret the service accepts anything, so the check fails.
    pub async fn check_secret(&self) -> Check {
        let Some(secret) = &self.config.webhook_secret else {
            return Check::fail(
                "secret",
                "TELEGRAM_WEBHOOK_SECRET not set, webhook accepts unauthenticated calls",
            );
        };
        let Some(base) = &self.base_url else {
            return Check::fail("secret", "PUBLIC_BASE_URL not set");
        };

        let url = format!("{}{}", base, WEBHOOK_PATH);
        let wrong = format!("wrong-{}", secret);

        let good = match self.post_update(&url, secret).await {
            Ok(status) => status,
            Err(e) => return Check::fail("secret", format!("correct secret: {}", describe(&e))),
        };
        let bad = match self.post_update(&url, &wrong).await {
            Ok(status) => status,
            Err(e) => return Check::fail("secret", format!("wrong secret: {}", describe(&e))),
        };

        if good == StatusCode::OK && bad == StatusCode::UNAUTHORIZED {
            Check::pass("secret", "correct secret accepted, wrong secret rejected")
        } else {
            Check::fail(
                "secret",
                format!(
                    "correct secret got {}, wrong secret got {} (want 200 and 401)",
                    good.as_u16(),
                    bad.as_u16()
                ),
            )
        }
    }

    async fn post_update(&self, url: &str, secret: &str) -> Result<StatusCode, reqwest::Error> {
        let resp = self
            .http
            .post(url)
            .header(SECRET_HEADER, secret)
            .json(&json!({ "update_id": 1 }))
            .send()
            .await?;
        Ok(resp.status())
    }

    pub async fn check_send(&self, chat_id: i64) -> Check {
        match self
            .telegram
            .send_message(chat_id, "hello-relay status check")
            .await
        {
            Ok(message) => Check::pass(
                "send",
                format!("message {} delivered to chat {}", message.message_id, chat_id),
            ),
            Err(e) => Check::fail("send", e.to_string()),
        }
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timed out after {}s", CHECK_TIMEOUT.as_secs())
    } else {
        e.to_string()
    }
}
