//! JSON output documents: the raw dump and the summary.

use std::path::Path;

use metrics_core::error::{MetricsError, Result};
use metrics_core::models::{Row, Summary};
use metrics_core::time_utils::utc_timestamp_now;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unaggregated copy of every fetched row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDump {
    /// UTC write time, `YYYY-MM-DD HH:MM:SS UTC`.
    #[serde(default)]
    pub last_updated: String,
    pub data: Vec<Row>,
}

impl RawDump {
    /// Wrap `rows` with the current timestamp.
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            last_updated: utc_timestamp_now(),
            data: rows,
        }
    }
}

/// Write `dump` to `path` as pretty-printed JSON.
pub fn write_raw_dump(path: &Path, dump: &RawDump) -> Result<()> {
    write_json(path, dump)?;
    debug!("Wrote {} rows to {}", dump.data.len(), path.display());
    Ok(())
}

/// Write `summary` to `path` as pretty-printed JSON.
pub fn write_summary(path: &Path, summary: &Summary) -> Result<()> {
    write_json(path, summary)?;
    debug!(
        "Wrote summary ({} weeks, {} months, {} countries) to {}",
        summary.weekly.len(),
        summary.monthly.len(),
        summary.countries.len(),
        path.display()
    );
    Ok(())
}

/// Atomically write `value` to `path`, creating parent directories if needed.
///
/// Non-ASCII text is written as UTF-8, not escaped.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let write_err = |source| MetricsError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(value)?;

    // Write to a temp file then rename for atomicity.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
