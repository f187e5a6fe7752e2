use serde::{Deserialize, Serialize};

/// Which source put a message on the timeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageOrigin {
    /// Loaded from `GET /api/chat-messages`. The sender is inferred, not reported.
    History,
    /// Received over the live relay.
    Live,
    /// Appended locally after a successful send.
    Local,
}

/// A single entry of the chat display list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    pub origin: MessageOrigin,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, text: impl Into<String>, origin: MessageOrigin) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            origin,
        }
    }

    /// Whether the sender was inferred rather than reported by the backend.
    #[must_use]
    pub const fn sender_is_inferred(&self) -> bool {
        matches!(self.origin, MessageOrigin::History)
    }
}

/// One persisted message as returned by the history endpoint.
///
/// Accepts both the flat shape (`{"message": ..}`) and the nested
/// `{"attributes": {"message": ..}}` shape. A record whose message is
/// missing or null decodes to an empty message instead of failing the
/// whole list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "serde_json::Value")]
pub struct MessageRecord {
    pub message: String,
}

impl From<serde_json::Value> for MessageRecord {
    fn from(value: serde_json::Value) -> Self {
        let field = value
            .get("message")
            .filter(|message| !message.is_null())
            .or_else(|| value.get("attributes").and_then(|attrs| attrs.get("message")));
        let message = match field {
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self { message }
    }
}

/// Body of `GET /api/chat-messages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageListResponse {
    #[serde(default)]
    pub data: Option<Vec<MessageRecord>>,
}

impl MessageListResponse {
    /// The records, treating a missing or null `data` field as empty.
    #[must_use]
    pub fn into_records(self) -> Vec<MessageRecord> {
        self.data.unwrap_or_default()
    }
}

/// Body of `POST /api/chat-messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateMessageRequest {
    pub data: MessagePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagePayload {
    pub message: String,
}

impl CreateMessageRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            data: MessagePayload {
                message: message.into(),
            },
        }
    }
}

/// Payload of an outbound relay `message` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayOutbound {
    pub username: String,
    pub text: String,
    pub token: String,
}

/// Payload of an inbound relay `message` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayInbound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub text: String,
}
