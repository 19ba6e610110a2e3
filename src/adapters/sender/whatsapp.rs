use super::{MessageSender, SendError, SendReceipt};
use crate::config::ProviderConfig;
use crate::domain::outcome::UNKNOWN_ERROR;
use crate::domain::recipient::normalize_destination;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;

/// What gets sent for each recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendMode {
    /// Free-form text carrying the personalized body.
    Text,
    /// A pre-approved template; the personalized body is not transmitted.
    Template { name: String, language: String },
}

/// WhatsApp Cloud API client, built once with its credentials.
#[derive(Debug, Clone)]
pub struct WhatsAppSender {
    client: reqwest::Client,
    messages_url: String,
    access_token: String,
    mode: SendMode,
}

impl WhatsAppSender {
    /// Creates a sender for the configured phone number.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ProviderConfig, mode: SendMode) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let messages_url = format!(
            "{}/{}/{}/messages",
            config.api_base_url.trim_end_matches('/'),
            config.api_version,
            config.phone_number_id
        );

        Ok(Self { client, messages_url, access_token: config.access_token.clone(), mode })
    }

    #[must_use]
    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    /// Sends a free-form text message regardless of the configured mode.
    ///
    /// # Errors
    /// See [`MessageSender::send_message`].
    pub async fn send_text(&self, to: &str, body: &str) -> Result<SendReceipt, SendError> {
        let to = normalize_destination(to);
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body }
        });
        self.post(&to, &payload).await
    }

    /// Marks an inbound message as read. Returns whether the provider accepted it.
    #[tracing::instrument(skip(self))]
    pub async fn mark_as_read(&self, message_id: &str) -> bool {
        let payload = json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id
        });

        match self.client.post(&self.messages_url).bearer_auth(&self.access_token).json(&payload).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::error!(error = %e, "Failed to mark message as read");
                false
            }
        }
    }

    async fn send_template(&self, to: &str, name: &str, language: &str) -> Result<SendReceipt, SendError> {
        let to = normalize_destination(to);
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": {
                "name": name,
                "language": { "code": language }
            }
        });
        self.post(&to, &payload).await
    }

    async fn post(&self, to: &str, payload: &Value) -> Result<SendReceipt, SendError> {
        let response = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SendError::Transport(e.to_string()))?;
        let result = classify_response(status, &body);

        match &result {
            Ok(receipt) => tracing::debug!(to, message_id = ?receipt.message_id, "Provider accepted message"),
            Err(e) => tracing::debug!(to, %status, response = %body, error = %e, "Provider did not accept message"),
        }

        result
    }
}

/// Turns a raw provider response into a send result.
///
/// A body that is not JSON is a transport failure carrying the raw text; a
/// non-success status is a rejection with the provider's `error.message`.
///
/// # Errors
/// Returns `SendError` for every response that is not an accepted message.
pub fn classify_response(status: StatusCode, body: &str) -> Result<SendReceipt, SendError> {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return Err(SendError::Transport(body.to_string()));
    };

    if status == StatusCode::OK {
        let message_id = parsed
            .get("messages")
            .and_then(|m| m.get(0))
            .and_then(|m| m.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        return Ok(SendReceipt { message_id });
    }

    let error = parsed
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_ERROR);
    Err(SendError::Rejected(error.to_string()))
}

#[async_trait]
impl MessageSender for WhatsAppSender {
    async fn send_message(&self, destination: &str, body: &str) -> Result<SendReceipt, SendError> {
        match &self.mode {
            SendMode::Text => self.send_text(destination, body).await,
            SendMode::Template { name, language } => self.send_template(destination, name, language).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    struct CapturedRequest {
        head: String,
        body: Value,
    }

    impl CapturedRequest {
        fn request_line(&self) -> &str {
            self.head.lines().next().unwrap_or_default()
        }

        fn header(&self, name: &str) -> Option<&str> {
            self.head
                .lines()
                .skip(1)
                .filter_map(|line| line.split_once(':'))
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.trim())
        }
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Accepts one HTTP/1.1 request, answers with `status` and `response`, and
    /// hands back what the client sent.
    async fn serve_once(status: &'static str, response: &'static str) -> (String, JoinHandle<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let header_end = loop {
                let n = stream.read(&mut chunk).await.expect("read");
                assert!(n > 0, "connection closed before headers were complete");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos;
                }
            };
            let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
            let body_end = header_end + 4 + content_length(&head);
            while buf.len() < body_end {
                let n = stream.read(&mut chunk).await.expect("read");
                assert!(n > 0, "connection closed before body was complete");
                buf.extend_from_slice(&chunk[..n]);
            }
            let body = serde_json::from_slice(&buf[header_end + 4..body_end]).expect("json body");

            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{response}",
                response.len()
            );
            stream.write_all(reply.as_bytes()).await.expect("write");
            let _ = stream.shutdown().await;

            CapturedRequest { head, body }
        });

        (format!("http://{addr}"), handle)
    }

    fn provider_config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            access_token: "token".to_string(),
            phone_number_id: "1234567890".to_string(),
            api_base_url: base_url.to_string(),
            api_version: "v22.0".to_string(),
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn test_success_extracts_first_message_id() {
        let body = r#"{"messaging_product":"whatsapp","contacts":[{"input":"111","wa_id":"111"}],"messages":[{"id":"wamid.HBgL"}]}"#;
        let receipt = classify_response(StatusCode::OK, body).expect("accepted");
        assert_eq!(receipt.message_id.as_deref(), Some("wamid.HBgL"));
    }

    #[test]
    fn test_success_without_messages_has_no_id() {
        let receipt = classify_response(StatusCode::OK, "{}").expect("accepted");
        assert_eq!(receipt.message_id, None);
    }

    #[test]
    fn test_rejection_uses_provider_error_message() {
        let body = r#"{"error":{"message":"(#131030) Recipient phone number not in allowed list","code":131030}}"#;
        assert_eq!(
            classify_response(StatusCode::BAD_REQUEST, body),
            Err(SendError::Rejected("(#131030) Recipient phone number not in allowed list".to_string()))
        );
    }

    #[test]
    fn test_rejection_without_error_field_is_unknown_error() {
        assert_eq!(
            classify_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail":"nope"}"#),
            Err(SendError::Rejected("Unknown error".to_string()))
        );
    }

    #[test]
    fn test_unparseable_body_is_transport_error_with_raw_text() {
        assert_eq!(
            classify_response(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>"),
            Err(SendError::Transport("<html>Bad Gateway</html>".to_string()))
        );
    }

    #[test]
    fn test_messages_url_is_built_from_config() {
        let sender = WhatsAppSender::new(&provider_config("https://graph.facebook.com/"), SendMode::Text)
            .expect("client builds");
        assert_eq!(sender.messages_url(), "https://graph.facebook.com/v22.0/1234567890/messages");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let sender = WhatsAppSender::new(&provider_config(&format!("http://{addr}")), SendMode::Text)
            .expect("client builds");
        let err = sender.send_message("+1 202-555-0111", "hi").await.unwrap_err();
        assert!(matches!(err, SendError::Transport(ref msg) if !msg.is_empty()), "got {err:?}");
    }

    #[tokio::test]
    async fn test_text_send_posts_normalized_payload_with_bearer_token() {
        let (base_url, server) = serve_once("200 OK", r#"{"messages":[{"id":"wamid.X"}]}"#).await;
        let sender = WhatsAppSender::new(&provider_config(&base_url), SendMode::Text).expect("client builds");

        let receipt = sender.send_message("+1 202-555-0111", "Hello Ann").await.expect("accepted");
        assert_eq!(receipt.message_id.as_deref(), Some("wamid.X"));

        let request = server.await.expect("server task");
        assert!(request.request_line().starts_with("POST /v22.0/1234567890/messages "), "{}", request.head);
        assert_eq!(request.header("authorization"), Some("Bearer token"));
        assert_eq!(
            request.body,
            json!({
                "messaging_product": "whatsapp",
                "to": "12025550111",
                "type": "text",
                "text": { "body": "Hello Ann" }
            })
        );
    }

    #[tokio::test]
    async fn test_template_send_carries_name_and_language() {
        let (base_url, server) = serve_once("200 OK", r#"{"messages":[{"id":"wamid.T"}]}"#).await;
        let mode = SendMode::Template { name: "hello_world".to_string(), language: "en_US".to_string() };
        let sender = WhatsAppSender::new(&provider_config(&base_url), mode).expect("client builds");

        let receipt = sender.send_message("15550100", "ignored in template mode").await.expect("accepted");
        assert_eq!(receipt.message_id.as_deref(), Some("wamid.T"));

        let request = server.await.expect("server task");
        assert_eq!(request.header("authorization"), Some("Bearer token"));
        assert_eq!(
            request.body,
            json!({
                "messaging_product": "whatsapp",
                "to": "15550100",
                "type": "template",
                "template": { "name": "hello_world", "language": { "code": "en_US" } }
            })
        );
    }

    #[tokio::test]
    async fn test_provider_error_status_is_rejection() {
        let (base_url, server) =
            serve_once("400 Bad Request", r#"{"error":{"message":"(#100) Invalid parameter","code":100}}"#).await;
        let sender = WhatsAppSender::new(&provider_config(&base_url), SendMode::Text).expect("client builds");

        let err = sender.send_message("15550100", "hi").await.unwrap_err();
        assert_eq!(err, SendError::Rejected("(#100) Invalid parameter".to_string()));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_mark_as_read_succeeds_on_ok() {
        let (base_url, server) = serve_once("200 OK", r#"{"success":true}"#).await;
        let sender = WhatsAppSender::new(&provider_config(&base_url), SendMode::Text).expect("client builds");

        assert!(sender.mark_as_read("wamid.in1").await);

        let request = server.await.expect("server task");
        assert!(request.request_line().starts_with("POST /v22.0/1234567890/messages "));
        assert_eq!(request.header("authorization"), Some("Bearer token"));
        assert_eq!(
            request.body,
            json!({ "messaging_product": "whatsapp", "status": "read", "message_id": "wamid.in1" })
        );
    }

    #[tokio::test]
    async fn test_mark_as_read_fails_on_error_status() {
        let (base_url, server) = serve_once("400 Bad Request", r#"{"error":{"message":"Invalid message id"}}"#).await;
        let sender = WhatsAppSender::new(&provider_config(&base_url), SendMode::Text).expect("client builds");

        assert!(!sender.mark_as_read("wamid.unknown").await);
        server.await.expect("server task");
    }
}
