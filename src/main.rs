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

use msgrelay::adapters::sender::SendMode;
use msgrelay::adapters::store::InMemoryMessageStore;
use msgrelay::config::Config;
use msgrelay::{AppBuilder, telemetry};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    let store = Arc::new(InMemoryMessageStore::new());
    let app = AppBuilder::new(config).with_store(Arc::clone(&store) as _).build()?;
    let recipients = app.load_recipients()?;

    let batch = &app.config().batch;
    tracing::info!(
        recipients = recipients.len(),
        source = %batch.contacts_file.display(),
        delay_secs = batch.delay_seconds,
        "Recipients loaded"
    );

    if !batch.assume_yes {
        let mode = match batch.send_mode() {
            SendMode::Text => "text".to_string(),
            SendMode::Template { name, language } => format!("template {name} ({language})"),
        };
        let count = recipients.len();
        let proceed = tokio::task::spawn_blocking(move || confirm(&prompt(count, &mode))).await??;
        if !proceed {
            tracing::info!("Sending cancelled by user");
            telemetry_guard.shutdown();
            return Ok(());
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    msgrelay::spawn_signal_handler(shutdown_tx);

    let result = app.run(&recipients, shutdown_rx).await;
    tracing::info!(messages = store.len(), "Outbound messages recorded");
    if let Some(path) = &result.report.failure_artifact {
        tracing::info!(
            path = %path.display(),
            "Retry failed recipients by pointing the contacts file at this artifact"
        );
    }

    telemetry_guard.shutdown();
    Ok(())
}

fn prompt(count: usize, mode: &str) -> String {
    format!("Send {mode} messages to {count} recipients? (y/n): ")
}

#[allow(clippy::print_stdout)]
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
