//! Main entry point for the Ayna Chat terminal client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::ClientConfig;
use std::path::PathBuf;

mod commands;
mod logging;
mod relay;
mod storage;

/// Ayna Chat CLI
#[derive(Parser)]
#[command(name = "ayna")]
#[command(about = "Terminal client for Ayna Chat", long_about = None)]
struct Cli {
    /// Path to a configuration file (yaml, json or toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding configuration and environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign up, inspect or end the stored session
    Session {
        #[command(subcommand)]
        action: commands::session::SessionCommand,
    },

    /// Read history, send messages, and follow the live relay
    Chat {
        #[command(subcommand)]
        action: commands::chat::ChatCommand,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(long, short)]
        shell: clap_complete::Shell,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(long, short, default_value = "yaml")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Completion { shell } => {
            commands::completion::generate_completion(shell);
            Ok(())
        }
        Commands::Config { format } => commands::config::generate_config(&format),
        Commands::Session { action } => {
            let config = resolve_config(cli.config, cli.api_url)?;
            commands::session::run(action, &config).await
        }
        Commands::Chat { action } => {
            let config = resolve_config(cli.config, cli.api_url)?;
            commands::chat::run(action, &config).await
        }
    }
}

fn resolve_config(path: Option<PathBuf>, api_url: Option<String>) -> Result<ClientConfig> {
    let config =
        ClientConfig::load_config(path, api_url).context("failed to load configuration")?;
    logging::init(&config.log_level);
    tracing::debug!(api = %config.api_base_url, relay = %config.relay_url, "configuration resolved");
    Ok(config)
}
