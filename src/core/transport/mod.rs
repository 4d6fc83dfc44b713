//! Backend transport: the seam between the session controller and the chatbot service.

mod error;
mod http;

pub use error::{ErrorKind, TransportError};
pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::message::ChatMessage;

/// Reply to a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
}

/// The signed-in user, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<ChatReply, TransportError>;
    async fn fetch_history(&self) -> Result<Vec<ChatMessage>, TransportError>;
    async fn fetch_current_user(&self) -> Result<UserProfile, TransportError>;
}

fn str_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
}

/// Reply text from a chat response body.
pub(crate) fn parse_reply(body: &Value) -> Option<ChatReply> {
    str_field(body, &["response", "reply", "message"]).map(|r| ChatReply {
        response: r.to_string(),
    })
}

/// Messages from a history response: a bare array, or an object wrapping one.
///
/// Entries the client cannot display (system prompts, empty turns) are skipped.
pub(crate) fn parse_history(body: &Value) -> Vec<ChatMessage> {
    let entries = match body {
        Value::Array(items) => Some(items),
        Value::Object(_) => ["messages", "history", "chats"]
            .iter()
            .find_map(|k| body.get(*k).and_then(Value::as_array)),
        _ => None,
    };
    entries
        .map(|items| items.iter().filter_map(ChatMessage::from_api).collect())
        .unwrap_or_default()
}

pub(crate) fn parse_profile(body: &Value) -> Option<UserProfile> {
    let user = body.get("user").unwrap_or(body);
    let name = str_field(user, &["name", "full_name", "username", "email"])?;
    Some(UserProfile {
        name: name.to_string(),
        avatar_url: str_field(user, &["avatar_url", "avatarUrl", "avatar"]).map(str::to_string),
    })
}

/// Server-supplied error message: `message`, `detail`, then `error`.
pub(crate) fn error_detail(body: &Value) -> Option<String> {
    str_field(body, &["message", "detail", "error"]).map(str::to_string)
}
