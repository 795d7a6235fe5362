//! Core types: update, message, chat, user and the transport response wrapper.
//!
//! Field names follow the Bot API wire names so fixtures can be deserialized directly.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// User identity (id, username, names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// Chat (group, channel or private) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: String,
}

/// An incoming message carried by an [`Update`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i32,
    pub chat: Chat,
    pub from: Option<User>,
    /// Send time in unix seconds.
    pub date: Option<i64>,
    pub text: Option<String>,
}

impl Message {
    /// Send time as a UTC timestamp, if present and representable.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.date.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

/// One event delivered by the platform. `message` is `None` for update kinds the runtime
/// does not model (callback queries, edits, ...); those still advance the offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

impl Update {
    /// Message text, if this update carries a text message.
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.text.as_deref())
    }

    /// Chat the message was sent in.
    pub fn chat_id(&self) -> Option<i64> {
        self.message.as_ref().map(|m| m.chat.id)
    }

    /// Id of the carried message (used as `reply_to`).
    pub fn message_id(&self) -> Option<i32> {
        self.message.as_ref().map(|m| m.message_id)
    }

    /// True when the message has a send time strictly before `cutoff`.
    /// Updates without a message or without a date are never outdated.
    pub fn is_outdated(&self, cutoff: DateTime<Utc>) -> bool {
        self.message
            .as_ref()
            .and_then(Message::sent_at)
            .map(|sent| sent < cutoff)
            .unwrap_or(false)
    }
}

/// Converts a transport-specific message type to core [`Message`].
pub trait ToCoreMessage {
    fn to_core(&self) -> Message;
}

/// Converts a transport-specific update type to core [`Update`].
pub trait ToCoreUpdate {
    fn to_core(&self) -> Update;
}

/// Result of a transport call: `ok` flag, optional payload and the platform's error text.
///
/// `ok = true` with `Some(vec![])` is a well-formed empty poll; `ok = false` or `result = None`
/// is a transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

impl<T> BasicResponse<T> {
    /// Successful response carrying `result`.
    pub fn ok(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            description: None,
        }
    }

    /// Failed response without payload.
    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            description: Some(description.into()),
        }
    }

    /// True only when the call succeeded and a payload is present.
    pub fn is_success(&self) -> bool {
        self.ok && self.result.is_some()
    }
}
