//! One sequential run: fetch → raw dump → aggregate → summary.
//!
//! Each finished stage is reported through a caller-supplied callback so the
//! binary can print status lines while tests collect them. The first failing
//! stage aborts the run; nothing after it is written.

use std::fmt;
use std::path::PathBuf;

use metrics_core::error::Result;
use metrics_core::models::Summary;
use metrics_data::aggregator::SummaryAggregator;
use metrics_data::writer::{write_raw_dump, write_summary, RawDump};
use tracing::info;

use crate::source::RowSource;

// ── Public types ──────────────────────────────────────────────────────────────

/// Where a run writes its documents.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    /// Raw dump destination; `None` skips the raw dump (offline re-runs).
    pub raw_dump: Option<PathBuf>,
    pub summary: PathBuf,
}

/// A completed pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Fetched { rows: usize, origin: String },
    RawDumpWritten { path: PathBuf },
    Aggregated { dated_rows: usize, skipped_rows: usize },
    SummaryWritten { path: PathBuf },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetched { rows, origin } => {
                write!(f, "✅ Fetched {} rows from {}", rows, origin)
            }
            Stage::RawDumpWritten { path } => {
                write!(f, "💾 Raw data saved to {}", path.display())
            }
            Stage::Aggregated {
                dated_rows,
                skipped_rows,
            } => write!(
                f,
                "📊 Aggregated {} dated rows ({} skipped without a parseable date)",
                dated_rows, skipped_rows
            ),
            Stage::SummaryWritten { path } => {
                write!(f, "💾 Summary saved to {}", path.display())
            }
        }
    }
}

// ── run ───────────────────────────────────────────────────────────────────────

/// Run the pipeline against `source`, calling `on_stage` after every stage.
pub async fn run<S: RowSource>(
    source: &S,
    outputs: &OutputPaths,
    mut on_stage: impl FnMut(&Stage),
) -> Result<Summary> {
    let mut report = |stage: Stage| {
        info!("{}", stage);
        on_stage(&stage);
    };

    let rows = source.fetch_rows().await?;
    report(Stage::Fetched {
        rows: rows.len(),
        origin: source.describe(),
    });

    if let Some(path) = &outputs.raw_dump {
        write_raw_dump(path, &RawDump::new(rows.clone()))?;
        report(Stage::RawDumpWritten { path: path.clone() });
    }

    let summary = SummaryAggregator::aggregate(&rows);
    report(Stage::Aggregated {
        dated_rows: summary.rows_total - summary.rows_skipped,
        skipped_rows: summary.rows_skipped,
    });

    write_summary(&outputs.summary, &summary)?;
    report(Stage::SummaryWritten {
        path: outputs.summary.clone(),
    });

    Ok(summary)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_core::error::MetricsError;
    use metrics_core::models::Row;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    /// In-memory source.
    struct StaticRows(Vec<Row>);

    impl RowSource for StaticRows {
        fn describe(&self) -> String {
            "memory".to_string()
        }

        async fn fetch_rows(&self) -> Result<Vec<Row>> {
            Ok(self.0.clone())
        }
    }

    /// Source that always fails, like a rejected token exchange.
    struct FailingSource;

    impl RowSource for FailingSource {
        fn describe(&self) -> String {
            "nowhere".to_string()
        }

        async fn fetch_rows(&self) -> Result<Vec<Row>> {
            Err(MetricsError::Auth("invalid_grant".to_string()))
        }
    }

    fn sample_rows() -> Vec<Row> {
        serde_json::from_value(json!([
            {"Date": "01/01/2024", "Country": "UA", "Created": "5", "Extra": "kept"},
            {"Date": "02/01/2024", "Country": "", "Created": "x"},
            {"Date": "", "Country": "PL", "Created": 9}
        ]))
        .unwrap()
    }

    fn outputs(tmp: &TempDir) -> OutputPaths {
        OutputPaths {
            raw_dump: Some(tmp.path().join("data.json")),
            summary: tmp.path().join("summary.json"),
        }
    }

    fn read_json(path: &std::path::Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_run_writes_both_documents_in_order() {
        let tmp = TempDir::new().expect("tempdir");
        let paths = outputs(&tmp);
        let mut stages = Vec::new();

        let summary = run(&StaticRows(sample_rows()), &paths, |s| stages.push(s.clone()))
            .await
            .expect("run");

        assert_eq!(
            stages,
            vec![
                Stage::Fetched {
                    rows: 3,
                    origin: "memory".to_string()
                },
                Stage::RawDumpWritten {
                    path: tmp.path().join("data.json")
                },
                Stage::Aggregated {
                    dated_rows: 2,
                    skipped_rows: 1
                },
                Stage::SummaryWritten {
                    path: tmp.path().join("summary.json")
                },
            ]
        );

        let raw = read_json(&tmp.path().join("data.json"));
        assert_eq!(raw["data"].as_array().unwrap().len(), 3);
        assert_eq!(raw["data"][0]["Extra"], json!("kept"));

        let doc = read_json(&tmp.path().join("summary.json"));
        assert_eq!(doc["totals"]["Created"], json!(5));
        assert_eq!(doc["countries"]["Unknown"]["Created"], json!(0));
        assert_eq!(summary.totals.created, 5);
    }

    #[tokio::test]
    async fn test_run_without_raw_dump() {
        let tmp = TempDir::new().expect("tempdir");
        let paths = OutputPaths {
            raw_dump: None,
            summary: tmp.path().join("summary.json"),
        };
        let mut stages = Vec::new();

        run(&StaticRows(sample_rows()), &paths, |s| stages.push(s.clone()))
            .await
            .expect("run");

        assert_eq!(stages.len(), 3);
        assert!(!tmp.path().join("data.json").exists());
        assert!(tmp.path().join("summary.json").exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let tmp = TempDir::new().expect("tempdir");
        let paths = outputs(&tmp);
        let mut stages = Vec::new();

        let err = run(&FailingSource, &paths, |s| stages.push(s.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, MetricsError::Auth(_)));
        assert!(stages.is_empty());
        assert!(!tmp.path().join("data.json").exists());
        assert!(!tmp.path().join("summary.json").exists());
    }

    #[tokio::test]
    async fn test_raw_dump_failure_skips_summary() {
        let tmp = TempDir::new().expect("tempdir");
        let blocker = tmp.path().join("data.json");
        std::fs::create_dir_all(blocker.join("child")).unwrap();
        let paths = outputs(&tmp);

        let result = run(&StaticRows(sample_rows()), &paths, |_| {}).await;

        assert!(matches!(result, Err(MetricsError::FileWrite { .. })));
        assert!(!tmp.path().join("summary.json").exists());
    }

    #[test]
    fn test_stage_display() {
        let stage = Stage::Fetched {
            rows: 42,
            origin: "memory".to_string(),
        };
        assert_eq!(stage.to_string(), "✅ Fetched 42 rows from memory");
    }
}
