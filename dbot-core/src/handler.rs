//! Handler capabilities: generic update handlers for the fallback chain and command handlers.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Update;

/// Generic handler tried in the fallback chain. Return `Ok(true)` to claim the update, which
/// stops the chain; `Ok(false)` passes it to the next handler.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn on_update(&self, update: &Update) -> Result<bool>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Handler invoked only when a registered command token matched. A matched command is terminal:
/// the fallback chain is not consulted afterwards, whatever the outcome.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// `argument` is the text after the command token with leading whitespace trimmed
    /// (empty when the command was sent alone).
    async fn handle_command(&self, update: &Update, chat_id: i64, argument: &str) -> Result<()>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
