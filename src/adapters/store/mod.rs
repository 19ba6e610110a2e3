use crate::domain::message::{ConversationSummary, StoredMessage};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

pub use memory::InMemoryMessageStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for conversations in both directions.
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug {
    /// Persists one message.
    ///
    /// # Errors
    /// Returns `StoreError` if the message could not be written.
    async fn save(&self, message: StoredMessage) -> Result<(), StoreError>;

    /// Messages exchanged with `destination`, oldest first, at most `limit`.
    ///
    /// # Errors
    /// Returns `StoreError` if the store cannot be read.
    async fn conversation(&self, destination: &str, limit: usize) -> Result<Vec<StoredMessage>, StoreError>;

    /// One summary per destination, most recently active first.
    ///
    /// # Errors
    /// Returns `StoreError` if the store cannot be read.
    async fn conversations(&self, limit: usize) -> Result<Vec<ConversationSummary>, StoreError>;

    /// Case-insensitive substring search over message bodies, newest first.
    ///
    /// # Errors
    /// Returns `StoreError` if the store cannot be read.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<StoredMessage>, StoreError>;
}
