use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Received,
    Sent,
    Delivered,
    Read,
    Failed,
}

/// A message as persisted by the conversation store, in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub destination: String,
    pub direction: Direction,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub status: MessageStatus,
    pub provider_message_id: Option<String>,
}

impl StoredMessage {
    #[must_use]
    pub fn outbound(destination: &str, body: &str, status: MessageStatus, provider_message_id: Option<String>) -> Self {
        Self {
            destination: destination.to_string(),
            direction: Direction::Outbound,
            body: body.to_string(),
            timestamp: OffsetDateTime::now_utc(),
            status,
            provider_message_id,
        }
    }
}

/// Per-destination view returned by conversation listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub destination: String,
    pub last_message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_timestamp: OffsetDateTime,
    pub total_messages: usize,
}
