mod api;
mod chat;
mod config;
mod errors;
mod resume;
#[cfg(test)]
mod test_support;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::ApiClient;
use crate::config::Config;
use crate::resume::store::LocalStore;

#[derive(Parser)]
#[command(name = "chat-client")]
#[command(about = "Terminal client for the chat and resume-builder backend", long_about = None)]
struct Cli {
    /// Backend base URL (overrides CHAT_API_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Sampling temperature between 0 and 1 (overrides CHAT_TEMPERATURE)
    #[arg(long, global = true)]
    temperature: Option<f64>,

    /// Local store file for the resume interview (overrides CHAT_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Streaming chat with conversation history (default)
    Chat,
    /// Guided resume interview
    Resume,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?.with_overrides(cli.base_url, cli.temperature, cli.store)?;

    // Logs go to stderr so they never interleave with the transcript.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("chat_client={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting chat-client v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.api_url
    );

    let client = ApiClient::new(&config.api_url)?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => ui::chat::run_chat(client, config.temperature).await?,
        Command::Resume => {
            let store = LocalStore::new(config.store_path.clone());
            ui::resume::run_resume(client, store).await?
        }
    }

    Ok(())
}
