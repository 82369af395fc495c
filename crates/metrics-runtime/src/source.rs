//! The seam between the pipeline and wherever rows come from.

use std::future::Future;
use std::path::PathBuf;

use metrics_core::error::Result;
use metrics_core::models::Row;
use metrics_data::reader::load_raw_dump;

/// Something that yields form-response rows in submission order.
pub trait RowSource {
    /// Human-readable origin, used in status output.
    fn describe(&self) -> String;

    /// Fetch every row.
    fn fetch_rows(&self) -> impl Future<Output = Result<Vec<Row>>> + Send;
}

/// Rows read back from a raw dump written by an earlier run.
#[derive(Debug, Clone)]
pub struct DumpSource {
    path: PathBuf,
}

impl DumpSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for DumpSource {
    fn describe(&self) -> String {
        format!("raw dump {}", self.path.display())
    }

    async fn fetch_rows(&self) -> Result<Vec<Row>> {
        Ok(load_raw_dump(&self.path)?.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_data::writer::{write_raw_dump, RawDump};
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_dump_source_returns_rows_in_order() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("data.json");
        let rows: Vec<Row> = serde_json::from_value(json!([
            {"Date": "01/01/2024", "Name": "A", "Country": "UA"},
            {"Date": "02/01/2024", "Name": "B", "Country": "PL"}
        ]))
        .unwrap();
        write_raw_dump(&path, &RawDump::new(rows.clone())).unwrap();

        let source = DumpSource::new(&path);
        assert!(source.describe().contains("data.json"));
        assert_eq!(source.fetch_rows().await.unwrap(), rows);
    }

    #[tokio::test]
    async fn test_dump_source_missing_file_errors() {
        let source = DumpSource::new("/definitely/not/here.json");
        assert!(source.fetch_rows().await.is_err());
    }
}
