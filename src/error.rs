use crate::services::LoadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to load recipients: {0}")]
    Load(#[from] LoadError),
    #[error("No recipients found in {0}")]
    NoRecipients(String),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
