//! # Handler chain
//!
//! Routes one update to exactly one dispatch path: a registered command handler when the message
//! text starts with a known command, otherwise the fallback chain, where the first handler that
//! claims the update ends the walk. Handler errors and panics are returned as a
//! [`DispatchFailure`] instead of unwinding the caller.

mod parser;
mod registry;
mod reply;

pub use parser::{CommandParser, ParsedCommand, ParserOptions};
pub use registry::{HandlerRegistry, RegistrySnapshot};
pub use reply::ReplyOnFailure;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use dbot_core::{DbotError, HandlerError, Update};
use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, info};

/// Outcome of routing one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A registered command handler ran; terminal for the update.
    Command(String),
    /// A fallback handler claimed the update (handler name).
    Claimed(String),
    /// No command matched and no fallback handler claimed it.
    Unclaimed,
}

/// A handler returned an error or panicked while processing an update.
#[derive(Debug, Error)]
#[error("handler {handler} failed: {source}")]
pub struct DispatchFailure {
    pub handler: String,
    #[source]
    pub source: DbotError,
}

impl RegistrySnapshot {
    /// Routes `update`: command first, fallback chain otherwise.
    pub async fn dispatch(&self, update: &Update) -> Result<Dispatch, DispatchFailure> {
        if let Some(dispatch) = self.invoke_command(update).await? {
            return Ok(dispatch);
        }

        for handler in self.chain() {
            let handler_name = handler.name();
            debug!(
                update_id = update.update_id,
                handler = %handler_name,
                "step: fallback handler processing"
            );
            let claimed = guarded(handler_name, handler.on_update(update)).await?;
            if claimed {
                info!(
                    update_id = update.update_id,
                    handler = %handler_name,
                    "step: update claimed by fallback handler"
                );
                return Ok(Dispatch::Claimed(handler_name.to_string()));
            }
        }

        Ok(Dispatch::Unclaimed)
    }

    async fn invoke_command(&self, update: &Update) -> Result<Option<Dispatch>, DispatchFailure> {
        let (Some(text), Some(chat_id)) = (update.text(), update.chat_id()) else {
            return Ok(None);
        };
        let Some(command) = self.parser().parse(text) else {
            return Ok(None);
        };
        let Some(handler) = self.lookup(&command.token) else {
            debug!(
                update_id = update.update_id,
                command = %command.token,
                "Unknown command, trying fallback chain"
            );
            return Ok(None);
        };

        info!(
            update_id = update.update_id,
            chat_id,
            command = %command.token,
            handler = %handler.name(),
            "step: command handler processing"
        );
        guarded(
            handler.name(),
            handler.handle_command(update, chat_id, command.argument),
        )
        .await?;
        Ok(Some(Dispatch::Command(command.token)))
    }
}

/// Awaits a handler future, turning both `Err` and panics into a [`DispatchFailure`].
async fn guarded<T, F>(handler: &str, fut: F) -> Result<T, DispatchFailure>
where
    F: Future<Output = dbot_core::Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(DispatchFailure {
            handler: handler.to_string(),
            source,
        }),
        Err(payload) => Err(DispatchFailure {
            handler: handler.to_string(),
            source: HandlerError::Panicked(panic_message(payload.as_ref())).into(),
        }),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// Integration tests live in tests/handler_chain_test.rs
