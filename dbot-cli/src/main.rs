//! dbot CLI: run the long-polling bot or check its configuration. Config from env and optional
//! CLI args.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dbot_cli::{load_config, register_builtin_handlers, Cli, Commands};
use dbot_core::{init_tracing, BotApi};
use dbot_telegram::{PollCycle, PollScheduler, TelegramBotApi};
use handler_chain::{CommandParser, HandlerRegistry};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token, offset } => handle_run(token, offset).await,
        Commands::Check { token } => handle_check(token),
    }
}

/// Builds transport, registry and scheduler, then polls until Ctrl-C.
async fn handle_run(token: Option<String>, offset: i64) -> Result<()> {
    let mut config = load_config(token)?;
    init_tracing(&config.log_file)?;

    let api = Arc::new(TelegramBotApi::from_config(&config)?);
    if config.bot_username.is_none() {
        config.bot_username = api.bot_username().await;
        if let Some(username) = &config.bot_username {
            info!(username = %username, "Bot username resolved via getMe");
        }
    }

    let bot: Arc<dyn BotApi> = api;
    let registry = Arc::new(HandlerRegistry::new(CommandParser::new(
        config.parser_options(),
    )));
    register_builtin_handlers(&registry, bot.clone());

    info!(
        batch_size = config.poll.batch_size,
        poll_timeout_secs = config.poll.poll_timeout_secs,
        update_expiration_secs = config.poll.update_expiration.as_secs(),
        commands = ?registry.commands(),
        "Bot started"
    );

    let cycle = PollCycle::new(bot, registry, config.poll.clone()).with_offset(offset);
    let (scheduler, shutdown) = PollScheduler::new(cycle);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, shutting down"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
        }
        shutdown.shutdown();
    });

    let final_offset = scheduler.run().await;
    info!(offset = final_offset, "Bot stopped");
    Ok(())
}

/// Validates config from env and prints the effective settings.
fn handle_check(token: Option<String>) -> Result<()> {
    let config = load_config(token)?;
    println!("Configuration OK");
    println!("  api url:            {}", config.telegram_api_url.as_deref().unwrap_or("default"));
    println!("  log file:           {}", config.log_file);
    println!("  batch size:         {}", config.poll.batch_size);
    println!("  poll timeout:       {}s", config.poll.poll_timeout_secs);
    println!("  update expiration:  {}s", config.poll.update_expiration.as_secs());
    println!("  cycle delay:        {}ms", config.poll.cycle_delay.as_millis());
    println!("  max backoff:        {}s", config.poll.max_backoff.as_secs());
    println!("  case-insensitive:   {}", config.command_case_insensitive);
    println!(
        "  bot username:       {}",
        config.bot_username.as_deref().unwrap_or("(resolved at startup)")
    );
    Ok(())
}
