//! hello-relay-webhook - manage the bot's webhook registration.
//!
//! Run on deploy (`reset`) or on demand. Prints the provider's result as JSON
//! and exits non-zero on failure.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hello_relay::{Config, Registrar};

#[derive(Parser)]
#[command(name = "hello-relay-webhook")]
#[command(version)]
#[command(about = "Register or remove the Telegram webhook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Public origin of the relay (overrides PUBLIC_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Point the webhook at {base}/webhook
    Set,
    /// Remove the webhook
    Delete,
    /// Delete, then set, for a clean registration
    Reset,
    /// Show the current webhook registration
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    let registrar = Registrar::from_config(&config).context("Failed to create registrar")?;

    let base = || {
        cli.base_url
            .clone()
            .or_else(|| config.public_base_url.clone())
            .context("PUBLIC_BASE_URL is not set and --base-url was not given")
    };

    let output = match cli.command {
        Command::Set => registrar.set(&base()?).await?,
        Command::Delete => registrar.delete().await?,
        Command::Reset => registrar.reset(&base()?).await?,
        Command::Info => serde_json::to_value(registrar.info().await?)?,
    };

    info!("webhook_command_complete");
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
