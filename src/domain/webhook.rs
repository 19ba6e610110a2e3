use crate::domain::message::{Direction, MessageStatus, StoredMessage};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Payload is missing `{0}`")]
    MissingEnvelope(&'static str),
    #[error("Message {index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("Message {index} has an invalid timestamp: {value}")]
    InvalidTimestamp { index: usize, value: String },
}

/// Result of parsing one webhook delivery.
///
/// Messages that fail to parse are reported individually in `rejected` so a
/// single bad entry does not hide the rest of the delivery.
#[derive(Debug, Default)]
pub struct WebhookBatch {
    pub messages: Vec<StoredMessage>,
    pub rejected: Vec<WebhookError>,
}

/// Parses an inbound webhook payload into stored-message shape.
///
/// Status callbacks carry no `messages` array and yield an empty batch.
///
/// # Errors
/// Returns `WebhookError::MissingEnvelope` if `entry[0].changes[0].value` is absent.
pub fn parse_webhook(payload: &Value) -> Result<WebhookBatch, WebhookError> {
    let entry = payload
        .get("entry")
        .and_then(|e| e.get(0))
        .ok_or(WebhookError::MissingEnvelope("entry"))?;
    let change = entry
        .get("changes")
        .and_then(|c| c.get(0))
        .ok_or(WebhookError::MissingEnvelope("changes"))?;
    let value = change.get("value").ok_or(WebhookError::MissingEnvelope("value"))?;

    let mut batch = WebhookBatch::default();
    let Some(messages) = value.get("messages").and_then(Value::as_array) else {
        return Ok(batch);
    };

    for (index, message) in messages.iter().enumerate() {
        match parse_message(index, message) {
            Ok(stored) => batch.messages.push(stored),
            Err(e) => batch.rejected.push(e),
        }
    }

    Ok(batch)
}

fn parse_message(index: usize, message: &Value) -> Result<StoredMessage, WebhookError> {
    let from = message
        .get("from")
        .and_then(Value::as_str)
        .ok_or(WebhookError::MissingField { index, field: "from" })?;
    let raw_timestamp = message.get("timestamp").ok_or(WebhookError::MissingField { index, field: "timestamp" })?;
    let timestamp = parse_timestamp(raw_timestamp)
        .ok_or_else(|| WebhookError::InvalidTimestamp { index, value: raw_timestamp.to_string() })?;
    let body = message
        .get("text")
        .and_then(|t| t.get("body"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(StoredMessage {
        destination: from.to_string(),
        direction: Direction::Inbound,
        body: body.to_string(),
        timestamp,
        status: MessageStatus::Received,
        provider_message_id: message.get("id").and_then(Value::as_str).map(str::to_string),
    })
}

fn parse_timestamp(value: &Value) -> Option<OffsetDateTime> {
    let secs = match value {
        Value::String(s) => s.parse::<i64>().ok()?,
        Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    OffsetDateTime::from_unix_timestamp(secs).ok()
}

/// Answers the subscription handshake: returns the challenge to echo back when
/// the mode is `subscribe` and the token matches.
#[must_use]
pub fn verify_subscription<'a>(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&'a str>,
    expected_token: &str,
) -> Option<&'a str> {
    if mode == Some("subscribe") && token == Some(expected_token) { challenge } else { None }
}
