#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::adapters::sender::{MessageSender, WhatsAppSender};
use crate::adapters::store::MessageStore;
use crate::config::Config;
use crate::domain::outcome::RunSummary;
use crate::domain::recipient::RecipientRecord;
use crate::error::{AppError, Result};
use crate::services::{DispatchObserver, Dispatcher, RecipientLoader, Report, Reporter, TracingObserver};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// A finished batch: the in-memory summary and what the reporter wrote.
#[derive(Debug)]
pub struct BatchResult {
    pub summary: RunSummary,
    pub report: Report,
}

/// The wired application: one loader, one dispatcher, one reporter.
#[derive(Debug)]
pub struct App {
    config: Config,
    loader: RecipientLoader,
    dispatcher: Dispatcher,
    reporter: Reporter,
}

impl App {
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Loads the configured recipient source.
    ///
    /// # Errors
    /// Returns `AppError::Load` if the source is unreadable and
    /// `AppError::NoRecipients` if it holds no records.
    pub fn load_recipients(&self) -> Result<Vec<RecipientRecord>> {
        let path = &self.config.batch.contacts_file;
        let recipients = self.loader.load(path)?;
        if recipients.is_empty() {
            return Err(AppError::NoRecipients(path.display().to_string()));
        }
        Ok(recipients)
    }

    /// Dispatches to every recipient, then reports the result.
    pub async fn run(&self, recipients: &[RecipientRecord], shutdown: watch::Receiver<bool>) -> BatchResult {
        let span = tracing::info_span!("run_batch", recipients = recipients.len());
        let summary = self
            .dispatcher
            .run_batch(recipients, &self.config.batch.message_template, self.config.batch.delay(), shutdown)
            .instrument(span)
            .await;

        if summary.cancelled {
            tracing::warn!(processed = summary.processed(), "Batch interrupted before completion");
        }

        let report = self.reporter.report(&summary);
        BatchResult { summary, report }
    }
}

pub struct AppBuilder {
    config: Config,
    sender: Option<Arc<dyn MessageSender>>,
    observer: Option<Arc<dyn DispatchObserver>>,
    store: Option<Arc<dyn MessageStore>>,
}

impl std::fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBuilder")
            .field("config", &self.config)
            .field("has_sender", &self.sender.is_some())
            .field("has_observer", &self.observer.is_some())
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, sender: None, observer: None, store: None }
    }

    #[must_use]
    pub fn with_sender(mut self, sender: Arc<dyn MessageSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validates the configuration and wires the components. Without an
    /// explicit sender, a `WhatsAppSender` is built from the provider settings.
    ///
    /// # Errors
    /// Returns `AppError::Config` for invalid settings and
    /// `AppError::HttpClient` if the HTTP client cannot be built.
    pub fn build(self) -> Result<App> {
        self.config.validate()?;

        let sender: Arc<dyn MessageSender> = match self.sender {
            Some(sender) => sender,
            None => Arc::new(WhatsAppSender::new(&self.config.provider, self.config.batch.send_mode())?),
        };
        let observer: Arc<dyn DispatchObserver> = match self.observer {
            Some(observer) => observer,
            None => Arc::new(TracingObserver::new()),
        };

        let mut dispatcher = Dispatcher::new(sender, observer);
        if let Some(store) = self.store {
            dispatcher = dispatcher.with_store(store);
        }

        Ok(App {
            loader: RecipientLoader::new(self.config.batch.destination_column.clone()),
            reporter: Reporter::new(self.config.batch.report_dir.clone()),
            dispatcher,
            config: self.config,
        })
    }
}

/// Flips `shutdown_tx` to `true` on ctrl-c; a second ctrl-c exits the process.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, shutdown_tx).await {
            tracing::warn!("Second interrupt received, exiting without waiting for the current message");
            std::process::exit(130);
        }
    });
}

/// Waits on `next_signal` for interrupts. The first requests a graceful stop
/// through `shutdown_tx`; returns `true` once a second one arrives, and
/// `false` if the signal source fails first.
pub async fn watch_interrupts<F, Fut>(mut next_signal: F, shutdown_tx: watch::Sender<bool>) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_signal().await {
        tracing::error!(error = %e, "Failed to listen for ctrl-c");
        return false;
    }
    tracing::warn!("Interrupt received, stopping after the current message (ctrl-c again to exit now)");
    let _ = shutdown_tx.send(true);

    match next_signal().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            false
        }
    }
}
