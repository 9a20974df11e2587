//! Web server module for the inbound webhook.
//!
//! Routes:
//! - `GET /` health check
//! - `POST /webhook` inbound updates from the provider
//! - `GET /set-webhook` registers the webhook on demand

pub mod handlers;
pub mod init;
pub mod secret;
pub mod tasks;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{auto_init, maybe_start_auto_init, root, set_webhook, webhook, AppState};
pub use init::WebhookInitializer;
pub use secret::{verify_secret_header, SECRET_HEADER};
pub use tasks::BackgroundTasks;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/webhook", post(webhook))
        .route("/set-webhook", get(set_webhook))
        .layer(middleware::from_fn_with_state(state.clone(), auto_init))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
