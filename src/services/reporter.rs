use crate::domain::outcome::{FailureRecord, RunSummary};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Timestamp formatting error: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// What the reporter produced for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub failure_artifact: Option<PathBuf>,
}

/// Emits the end-of-run summary and writes the failure artifact.
#[derive(Debug, Clone)]
pub struct Reporter {
    output_dir: PathBuf,
}

impl Reporter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    /// Logs the counts and, when there are failures, persists them.
    ///
    /// A write failure is logged and leaves `failure_artifact` empty; the
    /// summary itself is never touched.
    pub fn report(&self, summary: &RunSummary) -> Report {
        tracing::info!(
            sent = summary.sent_count,
            failed = summary.failed_count,
            skipped = summary.skipped_count,
            cancelled = summary.cancelled,
            "Sending summary: {} successful, {} failed",
            summary.sent_count,
            summary.failed_count
        );

        if summary.failures.is_empty() {
            return Report::default();
        }

        match self.write_failures(&summary.failures) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Failed messages saved");
                Report { failure_artifact: Some(path) }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save failed messages");
                Report::default()
            }
        }
    }

    /// Writes `failures` as a JSON array to a new, uniquely named file.
    ///
    /// # Errors
    /// Returns `PersistError` if the file cannot be created or written.
    pub fn write_failures(&self, failures: &[FailureRecord]) -> Result<PathBuf, PersistError> {
        let path = self.output_dir.join(artifact_name(OffsetDateTime::now_utc())?);

        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, failures)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(path)
    }
}

fn artifact_name(now: OffsetDateTime) -> Result<String, time::error::Format> {
    let stamp = now.format(format_description!("[year][month][day]_[hour][minute][second]"))?;
    let suffix = Uuid::new_v4().simple().to_string();
    Ok(format!("failed_messages_{stamp}_{}.json", &suffix[..8]))
}
