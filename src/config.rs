use crate::adapters::sender::SendMode;
use crate::error::AppError;
use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub provider: ProviderConfig,

    #[command(flatten)]
    pub batch: BatchConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ProviderConfig {
    /// Bearer token for the WhatsApp Cloud API
    #[arg(long, env = "MSGRELAY_WHATSAPP_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Sending phone number ID
    #[arg(long, env = "MSGRELAY_WHATSAPP_PHONE_NUMBER_ID")]
    pub phone_number_id: String,

    /// Base URL of the Graph API
    #[arg(long, env = "MSGRELAY_API_BASE_URL", default_value = "https://graph.facebook.com")]
    pub api_base_url: String,

    /// Graph API version segment
    #[arg(long, env = "MSGRELAY_API_VERSION", default_value = "v22.0")]
    pub api_version: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "MSGRELAY_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct BatchConfig {
    /// Recipient source (CSV with a header row, or a JSON failure artifact)
    #[arg(long, env = "MSGRELAY_CONTACTS_FILE", default_value = "contacts.csv")]
    pub contacts_file: PathBuf,

    /// Column holding the destination phone number
    #[arg(long, env = "MSGRELAY_DESTINATION_COLUMN", default_value = "phone")]
    pub destination_column: String,

    /// Message body; `{column}` placeholders are filled per recipient
    #[arg(long, env = "MSGRELAY_MESSAGE_TEMPLATE", default_value = "Hello {name}, this is a test message.")]
    pub message_template: String,

    /// Pause between consecutive sends, in seconds
    #[arg(long, env = "MSGRELAY_DELAY_SECONDS", default_value_t = 0.0)]
    pub delay_seconds: f64,

    /// Send a pre-approved template instead of free-form text
    #[arg(long, env = "MSGRELAY_USE_TEMPLATE", default_value_t = false)]
    pub use_template: bool,

    /// Template name used when `--use-template` is set
    #[arg(long, env = "MSGRELAY_TEMPLATE_NAME", default_value = "hello_world")]
    pub template_name: String,

    /// Template language code used when `--use-template` is set
    #[arg(long, env = "MSGRELAY_TEMPLATE_LANGUAGE", default_value = "en_US")]
    pub template_language: String,

    /// Directory for failure artifacts
    #[arg(long, env = "MSGRELAY_REPORT_DIR", default_value = ".")]
    pub report_dir: PathBuf,

    /// Skip the interactive confirmation
    #[arg(long = "yes", short = 'y', env = "MSGRELAY_ASSUME_YES", default_value_t = false)]
    pub assume_yes: bool,
}

impl BatchConfig {
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_seconds).unwrap_or(Duration::ZERO)
    }

    #[must_use]
    pub fn send_mode(&self) -> SendMode {
        if self.use_template {
            SendMode::Template { name: self.template_name.clone(), language: self.template_language.clone() }
        } else {
            SendMode::Text
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "MSGRELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP/HTTP collector endpoint; traces and metrics are exported when set
    #[arg(long, env = "MSGRELAY_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { log_format: LogFormat::Text, otlp_endpoint: None }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Checks what clap cannot: non-blank credentials and a usable delay.
    ///
    /// # Errors
    /// Returns `AppError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.provider.access_token.trim().is_empty() {
            return Err(AppError::Config("access token is empty".to_string()));
        }
        if self.provider.phone_number_id.trim().is_empty() {
            return Err(AppError::Config("phone number ID is empty".to_string()));
        }
        if self.batch.delay_seconds < 0.0 || Duration::try_from_secs_f64(self.batch.delay_seconds).is_err() {
            return Err(AppError::Config(format!(
                "delay must be a non-negative number of seconds, got {}",
                self.batch.delay_seconds
            )));
        }
        if self.provider.request_timeout_secs == 0 {
            return Err(AppError::Config("request timeout must be at least one second".to_string()));
        }
        Ok(())
    }
}
