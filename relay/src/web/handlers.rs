//! HTTP endpoint handlers.
//!
//! The webhook handler never waits on the provider: it verifies the secret,
//! parses the update, schedules the reply and returns.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::greeting::build_greeting;
use crate::registrar::{Registrar, RegistrarError};
use crate::telegram::{ReplySender, TelegramClient, TelegramError, Update};
use crate::web::init::WebhookInitializer;
use crate::web::secret::verify_secret_header;
use crate::web::tasks::BackgroundTasks;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sender: Arc<dyn ReplySender>,
    pub registrar: Registrar,
    pub initializer: Arc<WebhookInitializer>,
    pub tasks: BackgroundTasks,
}

impl AppState {
    pub fn new(config: Config, client: TelegramClient) -> Self {
        let registrar = Registrar::new(client.clone(), config.webhook_secret.clone());
        Self::with_sender(config, Arc::new(client), registrar)
    }

    pub fn with_sender(config: Config, sender: Arc<dyn ReplySender>, registrar: Registrar) -> Self {
        let initializer = WebhookInitializer::new(config.auto_init_webhook);
        Self {
            config: Arc::new(config),
            sender,
            registrar,
            initializer: Arc::new(initializer),
            tasks: BackgroundTasks::new(),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

pub async fn root() -> &'static str {
    "OK"
}

// =============================================================================
// Webhook
// =============================================================================

/// Inbound update endpoint.
///
/// 1. Rejects with 401 on secret mismatch, before looking at the body
/// 2. Rejects with 400 if the body is not an Update
/// 3. Schedules the greeting reply when the update carries a message
/// 4. Returns 200 "ok"
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if !verify_secret_header(state.config.webhook_secret.as_deref(), &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, body_length = body.len(), "webhook_invalid_update");
            return (StatusCode::BAD_REQUEST, "bad request").into_response();
        }
    };

    let Some(message) = update.effective_message() else {
        info!(update_id = update.update_id, "webhook_update_without_message");
        return (StatusCode::OK, "ok").into_response();
    };

    let chat_id = message.chat.id;
    let greeting = build_greeting(message.from.as_ref());

    info!(
        update_id = update.update_id,
        chat_id = chat_id,
        chat_type = %message.chat.kind,
        edited = update.message.is_none(),
        "webhook_update_received"
    );

    let send = state.sender.send_reply(chat_id, greeting);
    state.tasks.spawn(async move {
        match send.await {
            Ok(()) => info!(chat_id = chat_id, "reply_sent"),
            Err(e) => error!(chat_id = chat_id, error = %e, "reply_send_failed"),
        }
    });

    (StatusCode::OK, "ok").into_response()
}

// =============================================================================
// Webhook Registration
// =============================================================================

/// Register the webhook with the provider and report the outcome as JSON.
///
/// The URL always comes from `PUBLIC_BASE_URL`, never from request headers.
pub async fn set_webhook(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let outcome = match state.config.public_base_url.as_deref() {
        Some(base) => state.registrar.set(base).await,
        None => Err(RegistrarError::MissingBaseUrl),
    };

    match outcome {
        Ok(result) => (StatusCode::OK, Json(json!({ "ok": true, "result": result }))),
        Err(RegistrarError::Telegram(TelegramError::Api { status, data, .. })) => {
            warn!(status_code = status, "set_webhook_rejected");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "ok": false, "status": status, "data": data })),
            )
        }
        Err(e) => {
            error!(error = %e, "set_webhook_failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
        }
    }
}

// =============================================================================
// Cold-start Initialization
// =============================================================================

/// Start the one-time delete-then-set registration if this is the first
/// request of the process. Returns whether it was started.
///
/// Without `PUBLIC_BASE_URL` nothing runs and the latch stays untouched.
pub fn maybe_start_auto_init(state: &AppState) -> bool {
    let Some(base) = state.config.public_base_url.clone() else {
        return false;
    };

    if !state.initializer.try_begin() {
        return false;
    }

    info!(base_url = %base, "auto_init_starting");

    let registrar = state.registrar.clone();
    state.tasks.spawn(async move {
        match registrar.reset(&base).await {
            Ok(_) => info!("auto_init_complete"),
            Err(e) => error!(error = %e, "auto_init_failed"),
        }
    });

    true
}

/// Middleware running [`maybe_start_auto_init`] ahead of every route.
pub async fn auto_init(State(state): State<AppState>, request: Request, next: Next) -> Response {
    maybe_start_auto_init(&state);
    next.run(request).await
}
