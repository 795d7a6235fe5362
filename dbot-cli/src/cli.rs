//! CLI parser and config loading.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dbot_telegram::TelegramConfig;

#[derive(Parser)]
#[command(name = "dbot")]
#[command(about = "Long-polling Telegram bot CLI: run, check", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
        /// Initial offset; updates below it are not requested.
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Validate configuration and print the effective poll settings.
    Check {
        #[arg(short, long)]
        token: Option<String>,
    },
}

/// Loads and validates TelegramConfig from environment. If `token` is provided it overrides
/// BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<TelegramConfig> {
    let config = TelegramConfig::from_env(token).context("Load config from .env / environment")?;
    config.validate()?;
    Ok(config)
}
