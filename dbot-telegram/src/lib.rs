//! # dbot-telegram
//!
//! Telegram long-polling runtime: teloxide adapters, [`dbot_core::BotApi`] implementation, config
//! from env, the [`PollCycle`] unit of work and the [`PollScheduler`] driving it.
//! Handles only Telegram connectivity and update routing; no persistence or business logic.

mod adapters;
mod bot_adapter;
mod config;
mod poller;
mod scheduler;

pub use adapters::{TelegramMessageWrapper, TelegramUpdateWrapper};
pub use bot_adapter::TelegramBotApi;
pub use config::{PollConfig, TelegramConfig};
pub use poller::{CycleReport, PollCycle};
pub use scheduler::{PollScheduler, ShutdownHandle};
