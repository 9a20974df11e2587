//! Configuration module for environment variable parsing.
//!
//! Values are looked up in a local env file first (`.dev.vars`, then `.env`)
//! and fall back to the process environment.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

/// Env files checked in the current directory, first match wins.
pub const ENV_FILES: &[&str] = &[".dev.vars", ".env"];

/// Default Telegram Bot API origin.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
}

/// Application configuration, immutable for the life of the process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token used in `/bot<token>/<method>` API paths
    pub bot_token: Option<String>,

    /// Shared secret expected in `X-Telegram-Bot-Api-Secret-Token`
    pub webhook_secret: Option<String>,

    /// Public origin the provider should call, e.g. `https://relay.example.com`
    pub public_base_url: Option<String>,

    /// Re-register the webhook once on the first request after a cold start
    pub auto_init_webhook: bool,

    /// Chat that receives the status checker's test message
    pub test_chat_id: Option<i64>,

    /// Port for the web server to listen on
    pub port: u16,

    /// Telegram Bot API origin
    pub api_base: String,
}

impl Config {
    /// Load configuration from the first env file found, then the process environment.
    pub fn load() -> Self {
        Self::from_source(&EnvSource::discover())
    }

    pub fn from_source(source: &EnvSource) -> Self {
        Config {
            bot_token: source.get_non_empty("TELEGRAM_BOT_TOKEN"),

            webhook_secret: source.get_non_empty("TELEGRAM_WEBHOOK_SECRET"),

            public_base_url: source.get_non_empty("PUBLIC_BASE_URL"),

            auto_init_webhook: source
                .get("AUTO_INIT_WEBHOOK")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            test_chat_id: source.get_non_empty("TEST_CHAT_ID").and_then(|v| {
                v.parse()
                    .map_err(|_| warn!(env_var = "TEST_CHAT_ID", value = %v, "invalid_chat_id_ignored"))
                    .ok()
            }),

            port: source
                .get("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8787),

            api_base: source
                .get_non_empty("TELEGRAM_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    /// The bot token, or an error naming the missing variable.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.bot_token
            .as_deref()
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))
    }

    pub fn is_secret_enforced(&self) -> bool {
        self.webhook_secret.is_some()
    }
}

/// Key/value lookup over an env file with process-environment fallback.
#[derive(Debug, Default, Clone)]
pub struct EnvSource {
    file: HashMap<String, String>,
}

impl EnvSource {
    /// Read the first existing file from [`ENV_FILES`] in the current directory.
    pub fn discover() -> Self {
        for name in ENV_FILES {
            let path = Path::new(name);
            if !path.is_file() {
                continue;
            }
            match fs::read_to_string(path) {
                Ok(contents) => {
                    let source = Self::from_contents(&contents);
                    info!(file = name, keys = source.file.len(), "env_file_loaded");
                    return source;
                }
                Err(e) => warn!(file = name, error = %e, "env_file_unreadable"),
            }
        }
        Self::default()
    }

    pub fn from_contents(contents: &str) -> Self {
        Self {
            file: parse_env_file(contents).into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.file
            .get(name)
            .cloned()
            .or_else(|| env::var(name).ok())
    }

    /// Like [`EnvSource::get`], treating blank values as unset.
    pub fn get_non_empty(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Parse `KEY=VALUE` lines. Comments, blank lines and an `export ` prefix are allowed.
pub fn parse_env_file(contents: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            warn!(line = idx + 1, "env_file_line_skipped");
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            warn!(line = idx + 1, "env_file_line_skipped");
            continue;
        }

        pairs.push((key.to_string(), unquote(value.trim()).to_string()));
    }

    pairs
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
