//! Command decorator that tells the user when their command failed.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use dbot_core::{BotApi, CommandHandler, HandlerError, Result, Update};
use futures::FutureExt;
use tracing::{error, warn};

/// Wraps a [`CommandHandler`]; when the inner handler fails, sends a generic reply to the
/// originating message once, then returns the original error so it is still recorded. A panic
/// in the inner handler counts as a failure and comes back as [`HandlerError::Panicked`].
pub struct ReplyOnFailure {
    inner: Arc<dyn CommandHandler>,
    bot: Arc<dyn BotApi>,
    reply_text: String,
}

impl ReplyOnFailure {
    pub const DEFAULT_REPLY: &'static str = "Something went wrong, please try again later.";

    pub fn new(inner: Arc<dyn CommandHandler>, bot: Arc<dyn BotApi>) -> Self {
        Self {
            inner,
            bot,
            reply_text: Self::DEFAULT_REPLY.to_string(),
        }
    }

    /// Overrides the failure reply text.
    pub fn with_reply_text(mut self, text: impl Into<String>) -> Self {
        self.reply_text = text.into();
        self
    }
}

#[async_trait]
impl CommandHandler for ReplyOnFailure {
    async fn handle_command(&self, update: &Update, chat_id: i64, argument: &str) -> Result<()> {
        let result = match AssertUnwindSafe(self.inner.handle_command(update, chat_id, argument))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => {
                Err(HandlerError::Panicked(crate::panic_message(payload.as_ref())).into())
            }
        };
        if let Err(e) = &result {
            error!(
                update_id = update.update_id,
                handler = %self.inner.name(),
                error = %e,
                "Command failed, sending failure reply"
            );
            if let Err(send_err) = self
                .bot
                .send_message(chat_id, &self.reply_text, update.message_id())
                .await
            {
                warn!(chat_id, error = %send_err, "Failure reply could not be sent");
            }
        }
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
