use crate::adapters::sender::{MessageSender, SendError};
use crate::adapters::store::MessageStore;
use crate::domain::message::{MessageStatus, StoredMessage};
use crate::domain::outcome::{DispatchOutcome, OutcomeKind, RunSummary, UNKNOWN_ERROR};
use crate::domain::recipient::{RecipientRecord, normalize_destination};
use crate::services::observer::{DispatchObserver, DispatchWarning};
use crate::services::personalizer::personalize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Sends one message per recipient, in order, with a fixed pause between sends.
///
/// A dispatcher keeps no state between batches, so one instance can serve
/// several independent `run_batch` calls.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sender: Arc<dyn MessageSender>,
    observer: Arc<dyn DispatchObserver>,
    store: Option<Arc<dyn MessageStore>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(sender: Arc<dyn MessageSender>, observer: Arc<dyn DispatchObserver>) -> Self {
        Self { sender, observer, store: None }
    }

    /// Records every send attempt in `store` as an outbound message.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Runs one batch and returns its summary.
    ///
    /// Every recipient with a non-blank destination is attempted exactly once;
    /// per-recipient failures never stop the batch. When `shutdown` flips to
    /// `true` the batch stops before the next send and the partial summary is
    /// returned with `cancelled` set.
    pub async fn run_batch(
        &self,
        recipients: &[RecipientRecord],
        template: &str,
        delay: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> RunSummary {
        let total = recipients.len();
        let mut summary = RunSummary::new();

        for (i, recipient) in recipients.iter().enumerate() {
            let index = i + 1;

            if *shutdown.borrow() {
                summary.cancelled = true;
                break;
            }

            let raw = recipient.destination().trim();
            if raw.is_empty() {
                summary.record_skip();
                self.observer.on_warning(&DispatchWarning::BlankDestination { index });
                continue;
            }

            let destination = normalize_destination(raw);
            let rendered = personalize(template, recipient);
            for placeholder in rendered.missing {
                self.observer.on_warning(&DispatchWarning::MissingPlaceholder {
                    index,
                    destination: destination.clone(),
                    placeholder,
                });
            }

            self.observer.on_progress(index, total, &destination);
            let outcome = self.send_one(destination, &rendered.body).await;
            summary.record(&outcome);
            self.observer.on_outcome(index, total, &outcome);
            self.record_outbound(&outcome, &rendered.body).await;

            if index < total && !delay.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    Ok(_) = shutdown.wait_for(|&stop| stop) => {}
                }
            }
        }

        summary
    }

    async fn send_one(&self, destination: String, body: &str) -> DispatchOutcome {
        let kind = match self.sender.send_message(&destination, body).await {
            Ok(receipt) => OutcomeKind::Delivered { message_id: receipt.message_id },
            Err(SendError::Rejected(error)) => OutcomeKind::Rejected { error: error_text(error) },
            Err(SendError::Transport(error)) => OutcomeKind::TransportError { error: error_text(error) },
        };
        DispatchOutcome { destination, kind }
    }

    async fn record_outbound(&self, outcome: &DispatchOutcome, body: &str) {
        let Some(store) = &self.store else {
            return;
        };

        let status = if outcome.is_delivered() { MessageStatus::Sent } else { MessageStatus::Failed };
        let message =
            StoredMessage::outbound(&outcome.destination, body, status, outcome.message_id().map(str::to_string));
        if let Err(e) = store.save(message).await {
            self.observer.on_warning(&DispatchWarning::StoreFailed {
                destination: outcome.destination.clone(),
                error: e.to_string(),
            });
        }
    }
}

fn error_text(error: String) -> String {
    if error.trim().is_empty() { UNKNOWN_ERROR.to_string() } else { error }
}
