//! hello-relay-status - verify the bot and the deployed relay end to end.
//!
//! Exits 0 only if every check passes.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hello_relay::status::all_passed;
use hello_relay::{Config, StatusChecker};

#[derive(Parser)]
#[command(name = "hello-relay-status")]
#[command(version)]
#[command(about = "Check bot auth, webhook registration, health and secret enforcement", long_about = None)]
struct Cli {
    /// Public origin of the relay (overrides PUBLIC_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    let checker = StatusChecker::new(config, cli.base_url).context("Cannot run status checks")?;

    let checks = checker.run().await;
    for check in &checks {
        let mark = if check.ok { "PASS" } else { "FAIL" };
        println!("[{}] {:<8} {}", mark, check.name, check.detail);
    }

    if all_passed(&checks) {
        println!("all checks passed");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("some checks failed");
        Ok(ExitCode::FAILURE)
    }
}
