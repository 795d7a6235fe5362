//! Wraps teloxide::Bot and implements [`dbot_core::BotApi`]. Production code polls and sends via
//! Telegram; tests can substitute another BotApi impl.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use dbot_core::{BasicResponse, BotApi, DbotError, Result, ToCoreUpdate, Update};
use teloxide::payloads::{GetUpdatesSetters, SendMessageSetters};
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ReplyParameters};
use tracing::{debug, warn};

use crate::adapters::TelegramUpdateWrapper;
use crate::config::TelegramConfig;

/// Slack added to the HTTP timeout on top of the long-poll timeout, so the server answers
/// before the client gives up.
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

/// Thin wrapper around teloxide::Bot that implements dbot-core's BotApi.
pub struct TelegramBotApi {
    bot: teloxide::Bot,
}

impl TelegramBotApi {
    /// Platform maximum for `getUpdates` `limit`.
    pub const MAX_BATCH: u32 = 100;

    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Builds a bot whose HTTP client outlives the configured long-poll timeout, pointed at
    /// `telegram_api_url` when set.
    pub fn from_config(config: &TelegramConfig) -> anyhow::Result<Self> {
        let http_timeout =
            Duration::from_secs(u64::from(config.poll.poll_timeout_secs)) + HTTP_TIMEOUT_SLACK;
        let client = teloxide::net::default_reqwest_settings()
            .timeout(http_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let mut bot = teloxide::Bot::with_client(config.bot_token.clone(), client);
        if let Some(ref url_str) = config.telegram_api_url {
            let url = reqwest::Url::parse(url_str)
                .with_context(|| format!("Invalid TELEGRAM_API_URL: {}", url_str))?;
            bot = bot.set_api_url(url);
        }
        Ok(Self::new(bot))
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }

    /// Asks the platform for this bot's username (getMe). `None` on failure.
    pub async fn bot_username(&self) -> Option<String> {
        match self.bot.get_me().await {
            Ok(me) => me.user.username.clone(),
            Err(e) => {
                warn!(error = %e, "getMe failed, bot username unknown");
                None
            }
        }
    }
}

#[async_trait]
impl BotApi for TelegramBotApi {
    async fn get_updates(
        &self,
        offset: i64,
        limit: u32,
        timeout_secs: u32,
    ) -> BasicResponse<Vec<Update>> {
        let Ok(wire_offset) = i32::try_from(offset) else {
            return BasicResponse::failed(format!("offset {} does not fit the wire format", offset));
        };
        let limit = limit.clamp(1, Self::MAX_BATCH) as u8;

        debug!(offset, limit, timeout_secs, "getUpdates");

        match self
            .bot
            .get_updates()
            .offset(wire_offset)
            .limit(limit)
            .timeout(timeout_secs)
            .await
        {
            Ok(updates) => BasicResponse::ok(
                updates
                    .iter()
                    .map(|u| TelegramUpdateWrapper(u).to_core())
                    .collect(),
            ),
            Err(e) => {
                warn!(offset, error = %e, "getUpdates failed");
                BasicResponse::failed(e.to_string())
            }
        }
    }

    async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()> {
        let mut request = self.bot.send_message(ChatId(chat_id), text.to_string());
        if let Some(message_id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(message_id)));
        }
        request
            .await
            .map_err(|e| DbotError::Transport(e.to_string()))?;
        Ok(())
    }
}
