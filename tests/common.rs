#![allow(dead_code)]

use async_trait::async_trait;
use indexmap::IndexMap;
use msgrelay::adapters::sender::{MessageSender, SendError, SendReceipt};
use msgrelay::domain::outcome::DispatchOutcome;
use msgrelay::domain::recipient::RecipientRecord;
use msgrelay::services::{DispatchObserver, DispatchWarning};
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("msgrelay=debug".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

/// Builds a recipient whose fields are `pairs` plus the destination itself.
pub fn record(destination: &str, pairs: &[(&str, &str)]) -> RecipientRecord {
    let mut fields: IndexMap<String, String> = IndexMap::new();
    fields.insert("phone".to_string(), destination.to_string());
    for (key, value) in pairs {
        fields.insert((*key).to_string(), (*value).to_string());
    }
    RecipientRecord::new(destination, fields)
}

/// Records every call and fails for destinations listed in `rejects`/`drops`.
#[derive(Debug, Default)]
pub struct RecordingSender {
    pub calls: Mutex<Vec<(String, String)>>,
    pub rejects: Vec<String>,
    pub drops: Vec<String>,
}

impl RecordingSender {
    pub fn rejecting(destinations: &[&str]) -> Self {
        Self { rejects: destinations.iter().map(ToString::to_string).collect(), ..Self::default() }
    }

    pub fn dropping(destinations: &[&str]) -> Self {
        Self { drops: destinations.iter().map(ToString::to_string).collect(), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn destinations(&self) -> Vec<String> {
        self.calls().into_iter().map(|(destination, _)| destination).collect()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_message(&self, destination: &str, body: &str) -> Result<SendReceipt, SendError> {
        self.calls.lock().unwrap().push((destination.to_string(), body.to_string()));
        if self.rejects.iter().any(|d| d == destination) {
            return Err(SendError::Rejected("(#131030) Recipient phone number not in allowed list".to_string()));
        }
        if self.drops.iter().any(|d| d == destination) {
            return Err(SendError::Transport("connection reset by peer".to_string()));
        }
        Ok(SendReceipt { message_id: Some(format!("wamid.{destination}")) })
    }
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub progress: Mutex<Vec<(usize, usize, String)>>,
    pub warnings: Mutex<Vec<DispatchWarning>>,
    pub outcomes: Mutex<Vec<DispatchOutcome>>,
}

impl RecordingObserver {
    pub fn warnings(&self) -> Vec<DispatchWarning> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn outcomes(&self) -> Vec<DispatchOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl DispatchObserver for RecordingObserver {
    fn on_progress(&self, index: usize, total: usize, destination: &str) {
        self.progress.lock().unwrap().push((index, total, destination.to_string()));
    }

    fn on_warning(&self, warning: &DispatchWarning) {
        self.warnings.lock().unwrap().push(warning.clone());
    }

    fn on_outcome(&self, _index: usize, _total: usize, outcome: &DispatchOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}
