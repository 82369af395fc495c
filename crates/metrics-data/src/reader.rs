//! Loading previously written raw dumps for offline re-aggregation.

use std::path::Path;

use metrics_core::error::{MetricsError, Result};
use metrics_core::models::fields;
use serde_json::Value;
use tracing::warn;

use crate::writer::RawDump;

/// Number of leading records checked for the expected columns.
const SAMPLE_SIZE: usize = 5;

/// Columns every record is expected to carry.
const REQUIRED_FIELDS: &[&str] = &[fields::DATE, fields::NAME, fields::COUNTRY];

/// Read and validate a raw dump written by [`crate::writer::write_raw_dump`].
pub fn load_raw_dump(path: &Path) -> Result<RawDump> {
    let content = std::fs::read_to_string(path).map_err(|source| MetricsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: Value = serde_json::from_str(&content)?;

    for warning in validate_dump(&doc)? {
        warn!("{}: {}", path.display(), warning);
    }

    Ok(serde_json::from_value(doc)?)
}

/// Check the shape of a raw dump document.
///
/// Structural problems are errors. Missing columns in the first few records
/// and an empty `data` array are returned as warnings.
pub fn validate_dump(doc: &Value) -> Result<Vec<String>> {
    let Some(obj) = doc.as_object() else {
        return Err(MetricsError::InvalidDump("expected object".to_string()));
    };
    let Some(data) = obj.get("data") else {
        return Err(MetricsError::InvalidDump(
            "missing \"data\" property".to_string(),
        ));
    };
    let Some(records) = data.as_array() else {
        return Err(MetricsError::InvalidDump(
            "\"data\" must be an array".to_string(),
        ));
    };

    let mut warnings = Vec::new();
    if records.is_empty() {
        warnings.push("data array is empty".to_string());
        return Ok(warnings);
    }

    for (i, record) in records.iter().enumerate() {
        let Some(record) = record.as_object() else {
            return Err(MetricsError::InvalidDump(format!(
                "record at index {} is not an object",
                i
            )));
        };
        if i >= SAMPLE_SIZE {
            continue;
        }
        for field in REQUIRED_FIELDS {
            if !record.contains_key(*field) {
                warnings.push(format!("record at index {} missing field \"{}\"", i, field));
            }
        }
    }

    Ok(warnings)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::write_raw_dump;
    use metrics_core::models::{CellValue, Row};
    use serde_json::json;
    use tempfile::TempDir;

    // ── validate_dump ────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_non_object() {
        let err = validate_dump(&json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid data format: expected object");
    }

    #[test]
    fn test_validate_rejects_missing_data() {
        let err = validate_dump(&json!({"last_updated": "x"})).unwrap_err();
        assert!(err.to_string().contains("missing \"data\""));
    }

    #[test]
    fn test_validate_rejects_non_array_data() {
        let err = validate_dump(&json!({"data": {}})).unwrap_err();
        assert!(err.to_string().contains("must be an array"));
    }

    #[test]
    fn test_validate_rejects_non_object_record() {
        let err = validate_dump(&json!({"data": [{"Date": ""}, "oops"]})).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_validate_empty_data_is_warning() {
        let warnings = validate_dump(&json!({"data": []})).unwrap();
        assert_eq!(warnings, vec!["data array is empty".to_string()]);
    }

    #[test]
    fn test_validate_missing_fields_only_in_sample() {
        let mut records = vec![json!({"Date": "", "Name": "", "Country": ""}); 5];
        records[1] = json!({"Date": "", "Name": ""});
        // Beyond the sample; not reported.
        records.push(json!({}));
        let warnings = validate_dump(&json!({ "data": records })).unwrap();
        assert_eq!(
            warnings,
            vec!["record at index 1 missing field \"Country\"".to_string()]
        );
    }

    // ── load_raw_dump ────────────────────────────────────────────────────────

    #[test]
    fn test_load_round_trips_written_dump() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("data.json");

        let row: Row = [
            ("Date", CellValue::from("01/01/2024")),
            ("Name", CellValue::from("Olga")),
            ("Country", CellValue::Empty),
            ("Created", CellValue::Int(3)),
        ]
        .into_iter()
        .collect();
        let dump = RawDump::new(vec![row]);
        write_raw_dump(&path, &dump).expect("write");

        let loaded = load_raw_dump(&path).expect("load");
        assert_eq!(loaded, dump);
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().expect("tempdir");
        let err = load_raw_dump(&tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, MetricsError::FileRead { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_raw_dump(&path).unwrap_err();
        assert!(matches!(err, MetricsError::JsonParse(_)));
    }
}
