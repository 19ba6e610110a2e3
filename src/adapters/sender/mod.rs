use async_trait::async_trait;
use thiserror::Error;

pub mod whatsapp;

pub use whatsapp::{SendMode, WhatsAppSender};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The provider answered with a non-success status.
    #[error("Rejected by provider: {0}")]
    Rejected(String),
    /// The request never produced a usable answer (network, timeout, unparseable body).
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// What the provider handed back for an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

#[async_trait]
pub trait MessageSender: Send + Sync + std::fmt::Debug {
    /// Sends `body` to an already-normalized destination.
    ///
    /// # Errors
    /// Returns `SendError::Rejected` if the provider refused the message and
    /// `SendError::Transport` if no usable response was received.
    async fn send_message(&self, destination: &str, body: &str) -> Result<SendReceipt, SendError>;
}
