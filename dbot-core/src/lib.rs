//! # dbot-core
//!
//! Core types and capabilities for the polling bot runtime: [`Update`] and [`BasicResponse`],
//! the [`BotApi`] transport capability, the [`UpdateHandler`] / [`CommandHandler`] handler
//! capabilities, the error taxonomy, and tracing initialization. Transport-agnostic; used by
//! handler-chain and dbot-telegram.

pub mod bot_api;
pub mod error;
pub mod handler;
pub mod logger;
pub mod types;

pub use bot_api::BotApi;
pub use error::{DbotError, HandlerError, Result};
pub use handler::{CommandHandler, UpdateHandler};
pub use logger::init_tracing;
pub use types::{BasicResponse, Chat, Message, ToCoreMessage, ToCoreUpdate, Update, User};
