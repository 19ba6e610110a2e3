use super::{MessageStore, StoreError};
use crate::domain::message::{ConversationSummary, StoredMessage};
use async_trait::async_trait;
use dashmap::DashMap;

/// Process-local conversation store keyed by destination.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    conversations: DashMap<String, Vec<StoredMessage>>,
}

impl InMemoryMessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.iter().map(|entry| entry.value().len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save(&self, message: StoredMessage) -> Result<(), StoreError> {
        let mut entry = self.conversations.entry(message.destination.clone()).or_default();
        // Keep each conversation ordered by timestamp; ties keep arrival order.
        let position = entry.partition_point(|m| m.timestamp <= message.timestamp);
        entry.insert(position, message);
        Ok(())
    }

    async fn conversation(&self, destination: &str, limit: usize) -> Result<Vec<StoredMessage>, StoreError> {
        Ok(self
            .conversations
            .get(destination)
            .map(|messages| messages.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn conversations(&self, limit: usize) -> Result<Vec<ConversationSummary>, StoreError> {
        let mut summaries: Vec<ConversationSummary> = self
            .conversations
            .iter()
            .filter_map(|entry| {
                let last = entry.value().last()?;
                Some(ConversationSummary {
                    destination: entry.key().clone(),
                    last_message: last.body.clone(),
                    last_timestamp: last.timestamp,
                    total_messages: entry.value().len(),
                })
            })
            .collect();

        summaries.sort_by(|a, b| b.last_timestamp.cmp(&a.last_timestamp));
        summaries.truncate(limit);
        Ok(summaries)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<StoredMessage>, StoreError> {
        let needle = query.to_lowercase();
        let mut hits: Vec<StoredMessage> = self
            .conversations
            .iter()
            .flat_map(|entry| {
                entry.value().iter().filter(|m| m.body.to_lowercase().contains(&needle)).cloned().collect::<Vec<_>>()
            })
            .collect();

        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        hits.truncate(limit);
        Ok(hits)
    }
}
