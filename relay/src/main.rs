//! hello-relay web server.
//!
//! Receives Telegram updates on `POST /webhook`, verifies the shared secret
//! and replies with a greeting in the background. Background replies are
//! drained before the process exits.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hello_relay::web::router;
use hello_relay::{AppState, Config, TelegramClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    let config = Config::load();
    info!(
        port = config.port,
        secret_configured = config.is_secret_enforced(),
        public_base_url = ?config.public_base_url,
        auto_init_webhook = config.auto_init_webhook,
        "config_loaded"
    );

    if !config.is_secret_enforced() {
        warn!("webhook_secret_not_configured");
    }
    if config.auto_init_webhook && config.public_base_url.is_none() {
        warn!("auto_init_disabled_no_public_base_url");
    }

    let client = TelegramClient::from_config(&config).context("Cannot start without a bot token")?;

    let state = AppState::new(config.clone(), client);
    let tasks = state.tasks.clone();
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let scheduled replies finish before exiting
    tasks.drain().await;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
