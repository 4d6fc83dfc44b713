//! Chat data model: messages, senders, archived sessions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Opaque message identifier derived from the creation time.
///
/// Milliseconds since the epoch, followed by a process-wide sequence number so
/// messages created within the same millisecond stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

impl MessageId {
    pub fn new() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        MessageId(format!("{}-{}", millis, seq))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default)]
    pub is_error: bool,
}

impl ChatMessage {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        ChatMessage {
            id: MessageId::new(),
            sender,
            text: text.into(),
            is_loading: false,
            is_error: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    /// Placeholder shown while the bot reply is in flight.
    pub fn loading() -> Self {
        ChatMessage {
            is_loading: true,
            ..Self::new(Sender::Bot, "")
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        ChatMessage {
            is_error: true,
            ..Self::new(Sender::Bot, text)
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Parse a message as returned by the backend history endpoint.
    ///
    /// Accepts the client shape (`sender`/`text`) as well as the chat-completion
    /// shape (`role`/`content`, where content is a string or an array of text blocks).
    /// Returns `None` for system/tool entries and entries without text.
    pub fn from_api(value: &Value) -> Option<Self> {
        let sender = match value
            .get("sender")
            .or_else(|| value.get("role"))
            .and_then(|r| r.as_str())?
        {
            "user" => Sender::User,
            "bot" | "assistant" => Sender::Bot,
            _ => return None,
        };
        let text = value
            .get("text")
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .or_else(|| extract_content(value))?;
        let is_error = value
            .get("isError")
            .and_then(|e| e.as_bool())
            .unwrap_or(false);
        Some(ChatMessage {
            is_error,
            ..Self::new(sender, text)
        })
    }
}

/// Extract text content from an API message. Handles both string content and
/// array-of-blocks format.
fn extract_content(msg: &Value) -> Option<String> {
    let content = msg.get("content")?;
    if let Some(s) = content.as_str() {
        return Some(s.to_string());
    }
    if let Some(arr) = content.as_array() {
        for block in arr {
            if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// An archived conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub title: String,
    /// Creation time, RFC 3339.
    pub timestamp: String,
    pub history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(title: String, history: Vec<ChatMessage>) -> Self {
        ChatSession {
            title,
            timestamp: chrono::Utc::now().to_rfc3339(),
            history,
        }
    }

    /// History serialized without ids, used to compare sessions by content.
    pub fn content_fingerprint(&self) -> String {
        let entries: Vec<Value> = self
            .history
            .iter()
            .map(|m| {
                serde_json::json!({
                    "sender": m.sender,
                    "text": m.text,
                    "isError": m.is_error,
                })
            })
            .collect();
        Value::Array(entries).to_string()
    }
}
