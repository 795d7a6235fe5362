//! # dbot-cli
//!
//! CLI foundation: argument parsing, config loading and the built-in demo handlers.

pub mod cli;
pub mod commands;

pub use cli::{load_config, Cli, Commands};
pub use commands::register_builtin_handlers;
pub use dbot_telegram::TelegramConfig;
