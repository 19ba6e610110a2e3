use crate::domain::outcome::{DispatchOutcome, OutcomeKind};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::fmt;

/// Non-fatal conditions raised while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchWarning {
    /// The recipient at `index` (1-based) had a blank destination and was not sent.
    BlankDestination { index: usize },
    /// The template referenced a field the recipient does not carry.
    MissingPlaceholder { index: usize, destination: String, placeholder: String },
    /// The outcome could not be written to the message store.
    StoreFailed { destination: String, error: String },
}

impl fmt::Display for DispatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankDestination { index } => write!(f, "Skipping recipient {index}: no destination"),
            Self::MissingPlaceholder { placeholder, destination, .. } => {
                write!(f, "Missing placeholder {{{placeholder}}} for {destination}")
            }
            Self::StoreFailed { destination, error } => {
                write!(f, "Failed to record outbound message for {destination}: {error}")
            }
        }
    }
}

/// Receives dispatcher progress. Indices are 1-based over the whole batch.
pub trait DispatchObserver: Send + Sync + fmt::Debug {
    fn on_progress(&self, index: usize, total: usize, destination: &str);

    fn on_warning(&self, warning: &DispatchWarning);

    fn on_outcome(&self, index: usize, total: usize, outcome: &DispatchOutcome);
}

#[derive(Clone, Debug)]
struct Metrics {
    sent: Counter<u64>,
    failed: Counter<u64>,
    skipped: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("msgrelay");
        Self {
            sent: meter
                .u64_counter("msgrelay_messages_sent_total")
                .with_description("Total messages accepted by the provider")
                .build(),
            failed: meter
                .u64_counter("msgrelay_messages_failed_total")
                .with_description("Total messages rejected or lost in transport")
                .build(),
            skipped: meter
                .u64_counter("msgrelay_recipients_skipped_total")
                .with_description("Total recipients skipped for lack of a destination")
                .build(),
        }
    }
}

/// Logs batch progress through `tracing` and counts outcomes.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    metrics: Metrics,
}

impl TracingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self { metrics: Metrics::new() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchObserver for TracingObserver {
    fn on_progress(&self, index: usize, total: usize, destination: &str) {
        tracing::info!(index, total, destination, "[{index}/{total}] Sending to {destination}");
    }

    fn on_warning(&self, warning: &DispatchWarning) {
        if matches!(warning, DispatchWarning::BlankDestination { .. }) {
            self.metrics.skipped.add(1, &[]);
        }
        tracing::warn!("{warning}");
    }

    fn on_outcome(&self, index: usize, total: usize, outcome: &DispatchOutcome) {
        let destination = outcome.destination.as_str();
        match &outcome.kind {
            OutcomeKind::Delivered { message_id } => {
                self.metrics.sent.add(1, &[]);
                tracing::info!(index, total, destination, message_id = ?message_id, "Message delivered");
            }
            OutcomeKind::Rejected { error } => {
                self.metrics.failed.add(1, &[KeyValue::new("kind", outcome.label())]);
                tracing::error!(index, total, destination, error = %error, "Message rejected");
            }
            OutcomeKind::TransportError { error } => {
                self.metrics.failed.add(1, &[KeyValue::new("kind", outcome.label())]);
                tracing::error!(index, total, destination, error = %error, "Message transport failure");
            }
        }
    }
}
