//! agentgram main binary.

mod agents;
mod config;
mod handler;
mod menus;
mod server;
mod session;
mod store;

use clap::{Parser, Subcommand};
use config::AppConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "agentgram", version, about = "Telegram agent bot webhook server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the webhook server (default).
    Serve,
    /// Validate config and exit.
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let cfg = AppConfig::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::serve(cfg).await,
        Command::Doctor => server::doctor(cfg).await,
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new("info,agentgram=debug,ag_telegram=debug,ag_llm=debug"),
    };
    let log_format = std::env::var("AGENTGRAM_LOG_FORMAT")
        .unwrap_or_else(|_| "json".to_string())
        .to_ascii_lowercase();

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .json()
                .flatten_event(true)
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .compact()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported AGENTGRAM_LOG_FORMAT={other:?}; expected one of: json, compact"
            ));
        }
    }

    tracing::info!(
        log_format = %log_format,
        env_filter = ?std::env::var("RUST_LOG").ok(),
        "tracing initialized"
    );
    Ok(())
}
