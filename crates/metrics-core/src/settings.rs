use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{MetricsError, Result};

/// Spreadsheet holding the form responses.
pub const DEFAULT_SPREADSHEET_ID: &str = "1SNyKdbNIXHDdvqd71W57gkUe64Gsy2s9ylRCJJoJgJg";

/// Worksheet the form writes its responses to.
pub const DEFAULT_SHEET_NAME: &str = "Form responses 1";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Pull form responses from a spreadsheet and write raw and summary JSON
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sheet-metrics",
    about = "Pull form responses from a spreadsheet and write raw and summary JSON",
    version
)]
pub struct Settings {
    /// Spreadsheet identifier
    #[arg(long, env = "SHEET_METRICS_SPREADSHEET_ID", default_value = DEFAULT_SPREADSHEET_ID)]
    pub spreadsheet_id: String,

    /// Worksheet name inside the spreadsheet
    #[arg(long, env = "SHEET_METRICS_SHEET_NAME", default_value = DEFAULT_SHEET_NAME)]
    pub sheet_name: String,

    /// Service account key file, used before the key environment variables
    #[arg(long, env = "SHEET_METRICS_KEY_FILE", default_value = "service-account.json")]
    pub key_file: PathBuf,

    /// Raw dump output path
    #[arg(long, default_value = "data.json")]
    pub data_output: PathBuf,

    /// Summary output path
    #[arg(long, default_value = "summary.json")]
    pub summary_output: PathBuf,

    /// Re-aggregate an existing raw dump instead of fetching
    #[arg(long)]
    pub from_dump: Option<PathBuf>,

    /// HTTP timeout in seconds (1-300)
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout_secs: u64,

    /// Base URL of the Sheets API
    #[arg(long, env = "SHEET_METRICS_API_BASE", default_value = "https://sheets.googleapis.com")]
    pub sheets_api_base: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply `--debug`.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args(args: Vec<OsString>) -> Self {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Reject values clap cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(MetricsError::Config("spreadsheet id is empty".to_string()));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(MetricsError::Config("sheet name is empty".to_string()));
        }
        if !self.sheets_api_base.starts_with("http://")
            && !self.sheets_api_base.starts_with("https://")
        {
            return Err(MetricsError::Config(format!(
                "sheets api base must be an http(s) URL, got {}",
                self.sheets_api_base
            )));
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
