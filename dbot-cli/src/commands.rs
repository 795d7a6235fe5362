//! Built-in handlers registered by `dbot run`: `/start`, `/help`, `/ping`, `/echo` and a greeting
//! fallback. Every command is wrapped in [`ReplyOnFailure`] so users hear about failures.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::Utc;
use dbot_core::{BotApi, CommandHandler, HandlerError, Result, Update, UpdateHandler};
use handler_chain::{HandlerRegistry, ReplyOnFailure};

/// Registers the built-in commands and the greeting fallback on `registry`.
pub fn register_builtin_handlers(registry: &Arc<HandlerRegistry>, bot: Arc<dyn BotApi>) {
    registry.register(
        "start",
        with_failure_reply(Arc::new(StartCommand::new(bot.clone())), &bot),
    );
    registry.register(
        "help",
        with_failure_reply(
            Arc::new(HelpCommand::new(Arc::downgrade(registry), bot.clone())),
            &bot,
        ),
    );
    registry.register(
        "ping",
        with_failure_reply(Arc::new(PingCommand::new(bot.clone())), &bot),
    );
    registry.register(
        "echo",
        Arc::new(
            ReplyOnFailure::new(Arc::new(EchoCommand::new(bot.clone())), bot.clone())
                .with_reply_text(EchoCommand::USAGE),
        ),
    );
    registry.add_fallback(Arc::new(GreetingHandler::new(bot)));
}

fn with_failure_reply(
    handler: Arc<dyn CommandHandler>,
    bot: &Arc<dyn BotApi>,
) -> Arc<dyn CommandHandler> {
    Arc::new(ReplyOnFailure::new(handler, bot.clone()))
}

pub struct StartCommand {
    bot: Arc<dyn BotApi>,
}

impl StartCommand {
    pub fn new(bot: Arc<dyn BotApi>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl CommandHandler for StartCommand {
    async fn handle_command(&self, _update: &Update, chat_id: i64, _argument: &str) -> Result<()> {
        self.bot
            .send_message(chat_id, "Hi! Send /help to see what I can do.", None)
            .await
    }
}

/// Lists registered commands. Holds the registry weakly since the registry owns this handler.
pub struct HelpCommand {
    registry: Weak<HandlerRegistry>,
    bot: Arc<dyn BotApi>,
}

impl HelpCommand {
    pub fn new(registry: Weak<HandlerRegistry>, bot: Arc<dyn BotApi>) -> Self {
        Self { registry, bot }
    }
}

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn handle_command(&self, _update: &Update, chat_id: i64, _argument: &str) -> Result<()> {
        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| HandlerError::Failed("registry dropped".to_string()))?;
        let list = registry
            .commands()
            .iter()
            .map(|token| format!("/{}", token))
            .collect::<Vec<_>>()
            .join("\n");
        self.bot
            .send_message(chat_id, &format!("Commands:\n{}", list), None)
            .await
    }
}

/// Replies `pong` with the delivery delay in seconds.
pub struct PingCommand {
    bot: Arc<dyn BotApi>,
}

impl PingCommand {
    pub fn new(bot: Arc<dyn BotApi>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl CommandHandler for PingCommand {
    async fn handle_command(&self, update: &Update, chat_id: i64, _argument: &str) -> Result<()> {
        let text = match update.message.as_ref().and_then(|m| m.date) {
            Some(sent) => format!("pong ({}s)", (Utc::now().timestamp() - sent).max(0)),
            None => "pong".to_string(),
        };
        self.bot
            .send_message(chat_id, &text, update.message_id())
            .await
    }
}

pub struct EchoCommand {
    bot: Arc<dyn BotApi>,
}

impl EchoCommand {
    pub const USAGE: &'static str = "Usage: /echo <text>";

    pub fn new(bot: Arc<dyn BotApi>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl CommandHandler for EchoCommand {
    async fn handle_command(&self, update: &Update, chat_id: i64, argument: &str) -> Result<()> {
        if argument.is_empty() {
            return Err(HandlerError::InvalidArgument("empty echo".to_string()).into());
        }
        self.bot
            .send_message(chat_id, argument, update.message_id())
            .await
    }
}

/// Claims plain greetings ("hi", "hello", "hey") and greets back.
pub struct GreetingHandler {
    bot: Arc<dyn BotApi>,
}

impl GreetingHandler {
    const GREETINGS: [&'static str; 3] = ["hi", "hello", "hey"];

    pub fn new(bot: Arc<dyn BotApi>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl UpdateHandler for GreetingHandler {
    async fn on_update(&self, update: &Update) -> Result<bool> {
        let (Some(text), Some(chat_id)) = (update.text(), update.chat_id()) else {
            return Ok(false);
        };
        let word = text
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();
        if !Self::GREETINGS.contains(&word.as_str()) {
            return Ok(false);
        }

        let name = update
            .message
            .as_ref()
            .and_then(|m| m.from.as_ref())
            .and_then(|u| u.first_name.clone())
            .unwrap_or_else(|| "there".to_string());
        self.bot
            .send_message(chat_id, &format!("Hello, {}!", name), update.message_id())
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbot_core::{BasicResponse, Chat, Message, User};
    use handler_chain::Dispatch;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBot {
        sent: Mutex<Vec<(i64, String, Option<i32>)>>,
    }

    #[async_trait]
    impl BotApi for RecordingBot {
        async fn get_updates(&self, _: i64, _: u32, _: u32) -> BasicResponse<Vec<Update>> {
            BasicResponse::ok(Vec::new())
        }

        async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((chat_id, text.to_string(), reply_to));
            Ok(())
        }
    }

    fn update(text: &str) -> Update {
        Update {
            update_id: 1,
            message: Some(Message {
                message_id: 9,
                chat: Chat {
                    id: 456,
                    chat_type: "private".to_string(),
                },
                from: Some(User {
                    id: 1,
                    is_bot: false,
                    username: None,
                    first_name: Some("Alice".to_string()),
                }),
                date: Some(Utc::now().timestamp()),
                text: Some(text.to_string()),
            }),
        }
    }

    fn setup() -> (Arc<HandlerRegistry>, Arc<RecordingBot>) {
        let bot = Arc::new(RecordingBot::default());
        let registry = Arc::new(HandlerRegistry::default());
        register_builtin_handlers(&registry, bot.clone());
        (registry, bot)
    }

    #[tokio::test]
    async fn test_help_lists_commands() {
        let (registry, bot) = setup();
        let result = registry.snapshot().dispatch(&update("/help")).await.unwrap();

        assert_eq!(result, Dispatch::Command("help".to_string()));
        let sent = bot.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "Commands:\n/echo\n/help\n/ping\n/start");
    }

    #[tokio::test]
    async fn test_echo_replies_with_argument() {
        let (registry, bot) = setup();
        registry
            .snapshot()
            .dispatch(&update("/echo Hello There"))
            .await
            .unwrap();

        assert_eq!(
            *bot.sent.lock().unwrap(),
            vec![(456, "Hello There".to_string(), Some(9))]
        );
    }

    #[tokio::test]
    async fn test_echo_without_argument_replies_usage() {
        let (registry, bot) = setup();
        let result = registry.snapshot().dispatch(&update("/echo")).await;

        assert!(result.is_err());
        assert_eq!(
            *bot.sent.lock().unwrap(),
            vec![(456, EchoCommand::USAGE.to_string(), Some(9))]
        );
    }

    #[tokio::test]
    async fn test_ping_replies_pong() {
        let (registry, bot) = setup();
        registry.snapshot().dispatch(&update("/ping")).await.unwrap();

        let sent = bot.sent.lock().unwrap();
        assert!(sent[0].1.starts_with("pong"));
    }

    #[tokio::test]
    async fn test_greeting_fallback_claims_greetings_only() {
        let (registry, bot) = setup();
        let snapshot = registry.snapshot();

        assert!(matches!(
            snapshot.dispatch(&update("Hello!")).await.unwrap(),
            Dispatch::Claimed(_)
        ));
        assert_eq!(
            snapshot.dispatch(&update("what is the rate")).await.unwrap(),
            Dispatch::Unclaimed
        );
        assert_eq!(
            *bot.sent.lock().unwrap(),
            vec![(456, "Hello, Alice!".to_string(), Some(9))]
        );
    }
}
