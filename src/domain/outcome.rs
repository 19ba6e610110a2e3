use serde::{Deserialize, Serialize};

/// Error text used when the provider rejects a send without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeKind {
    Delivered { message_id: Option<String> },
    Rejected { error: String },
    TransportError { error: String },
}

/// Terminal classification of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub destination: String,
    pub kind: OutcomeKind,
}

impl DispatchOutcome {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self.kind, OutcomeKind::Delivered { .. })
    }

    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Delivered { message_id } => message_id.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Delivered { .. } => None,
            OutcomeKind::Rejected { error } | OutcomeKind::TransportError { error } => Some(error),
        }
    }

    /// Short label used for logs and metric attributes.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self.kind {
            OutcomeKind::Delivered { .. } => "delivered",
            OutcomeKind::Rejected { .. } => "rejected",
            OutcomeKind::TransportError { .. } => "transport_error",
        }
    }
}

/// A non-delivered send, as written to the failure artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub destination: String,
    pub error: String,
}

/// Aggregate state of one batch.
///
/// `sent_count + failed_count` is the number of recipients with a non-blank
/// destination processed so far, and `failed_count == failures.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sent_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    pub failures: Vec<FailureRecord>,
    pub cancelled: bool,
}

impl RunSummary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one outcome into the counters.
    pub fn record(&mut self, outcome: &DispatchOutcome) {
        match &outcome.kind {
            OutcomeKind::Delivered { .. } => self.sent_count += 1,
            OutcomeKind::Rejected { error } | OutcomeKind::TransportError { error } => {
                self.failed_count += 1;
                self.failures.push(FailureRecord { destination: outcome.destination.clone(), error: error.clone() });
            }
        }
    }

    pub const fn record_skip(&mut self) {
        self.skipped_count += 1;
    }

    #[must_use]
    pub const fn processed(&self) -> usize {
        self.sent_count + self.failed_count
    }
}
