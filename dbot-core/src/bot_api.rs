//! Transport capability consumed by the poll loop.
//!
//! [`BotApi`] is transport-agnostic; `dbot-telegram` implements it over teloxide and tests
//! substitute scripted doubles.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BasicResponse, Update};

/// Long-poll fetch and message send. Implementations must be shareable across tasks.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Fetches at most `limit` updates with id >= `offset`, blocking server-side for up to
    /// `timeout_secs` when none are pending. Failures are reported in the response, never raised.
    async fn get_updates(
        &self,
        offset: i64,
        limit: u32,
        timeout_secs: u32,
    ) -> BasicResponse<Vec<Update>>;

    /// Sends `text` to `chat_id`, optionally as a reply to `reply_to` (a message id in that chat).
    async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()>;
}
