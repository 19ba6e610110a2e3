use crate::domain::recipient::RecipientRecord;
use indexmap::IndexMap;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Recipient source not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to parse recipient source: {0}")]
    Parse(String),
}

impl From<csv::Error> for LoadError {
    fn from(e: csv::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Reads recipient sources into ordered records.
#[derive(Debug, Clone)]
pub struct RecipientLoader {
    destination_column: String,
}

impl RecipientLoader {
    #[must_use]
    pub fn new(destination_column: impl Into<String>) -> Self {
        Self { destination_column: destination_column.into() }
    }

    /// Loads a source file. Files ending in `.json` are read as a JSON array of
    /// objects (the failure artifact format); anything else as CSV with a header row.
    ///
    /// # Errors
    /// Returns `LoadError::NotFound` if the file does not exist and
    /// `LoadError::Parse` if it cannot be read or parsed.
    #[tracing::instrument(err(level = "warn"), skip(self, path), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<Vec<RecipientRecord>, LoadError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadError::NotFound(path.to_path_buf())),
            Err(e) => return Err(e.into()),
        };
        let reader = BufReader::new(file);

        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let records = if is_json { self.load_json(reader)? } else { self.load_csv(reader)? };

        tracing::info!(count = records.len(), "Loaded recipients");
        Ok(records)
    }

    /// Reads CSV with a header row. Short rows simply lack the trailing fields.
    ///
    /// # Errors
    /// Returns `LoadError::Parse` on malformed input.
    pub fn load_csv<R: Read>(&self, reader: R) -> Result<Vec<RecipientRecord>, LoadError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}').to_string() } else { h.to_string() })
            .collect();

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            let fields: IndexMap<String, String> =
                headers.iter().cloned().zip(row.iter().map(str::to_string)).collect();
            records.push(RecipientRecord::from_fields(fields, &self.destination_column));
        }

        Ok(records)
    }

    /// Reads a JSON array of flat objects. Non-string scalars are stringified and nulls dropped.
    ///
    /// # Errors
    /// Returns `LoadError::Parse` if the input is not an array of objects.
    pub fn load_json<R: Read>(&self, reader: R) -> Result<Vec<RecipientRecord>, LoadError> {
        let rows: Vec<IndexMap<String, Value>> = serde_json::from_reader(reader)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let fields: IndexMap<String, String> = row
                    .into_iter()
                    .filter_map(|(key, value)| match value {
                        Value::Null => None,
                        Value::String(s) => Some((key, s)),
                        other => Some((key, other.to_string())),
                    })
                    .collect();
                RecipientRecord::from_fields(fields, &self.destination_column)
            })
            .collect())
    }
}

impl Default for RecipientLoader {
    fn default() -> Self {
        Self::new("phone")
    }
}
