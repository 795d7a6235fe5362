//! Adapters from Telegram (teloxide) types to dbot_core types.
//! Depends only on teloxide and dbot_core type definitions.

use dbot_core::{Chat, Message, ToCoreMessage, ToCoreUpdate, Update, User};
use teloxide::types::UpdateKind;

/// Wraps a teloxide Update for conversion to core [`Update`]. Kinds other than a new message
/// keep their id but carry no message.
pub struct TelegramUpdateWrapper<'a>(pub &'a teloxide::types::Update);

impl ToCoreUpdate for TelegramUpdateWrapper<'_> {
    fn to_core(&self) -> Update {
        let message = match &self.0.kind {
            UpdateKind::Message(msg) => Some(TelegramMessageWrapper(msg).to_core()),
            _ => None,
        };
        Update {
            update_id: i64::from(self.0.id.0),
            message,
        }
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`].
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl ToCoreMessage for TelegramMessageWrapper<'_> {
    fn to_core(&self) -> Message {
        let msg = self.0;
        Message {
            message_id: msg.id.0,
            chat: Chat {
                id: msg.chat.id.0,
                chat_type: chat_type_name(&msg.chat).to_string(),
            },
            from: msg.from.as_ref().map(|u| User {
                id: u.id.0 as i64,
                is_bot: u.is_bot,
                username: u.username.clone(),
                first_name: Some(u.first_name.clone()),
            }),
            date: Some(msg.date.timestamp()),
            text: msg.text().map(str::to_string),
        }
    }
}

fn chat_type_name(chat: &teloxide::types::Chat) -> &'static str {
    if chat.is_private() {
        "private"
    } else if chat.is_supergroup() {
        "supergroup"
    } else if chat.is_group() {
        "group"
    } else if chat.is_channel() {
        "channel"
    } else {
        "unknown"
    }
}
