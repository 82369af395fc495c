//! Normalization of loosely typed sheet cells.
//!
//! Every numeric read of a cell goes through [`coerce_count`]; every string
//! coming off the wire goes through [`numericise`].

use crate::models::CellValue;

/// Best-effort integer count for a cell. Never fails.
///
/// * numbers are truncated toward zero (non-finite floats give `0`)
/// * text is trimmed, a decimal comma becomes a point, and the result is
///   parsed as a float and truncated; unparseable text gives `0`
/// * empty cells give `0`
///
/// ```
/// use metrics_core::coercion::coerce_count;
/// use metrics_core::models::CellValue;
///
/// assert_eq!(coerce_count(&CellValue::Text("3,5".into())), 3);
/// assert_eq!(coerce_count(&CellValue::Float(7.9)), 7);
/// assert_eq!(coerce_count(&CellValue::Text("abc".into())), 0);
/// ```
pub fn coerce_count(value: &CellValue) -> i64 {
    match value {
        CellValue::Int(i) => *i,
        CellValue::Float(f) => truncate(*f),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return 0;
            }
            trimmed
                .replace(',', ".")
                .parse::<f64>()
                .map(truncate)
                .unwrap_or(0)
        }
        CellValue::Empty => 0,
    }
}

/// Saturates at the i64 bounds.
fn truncate(f: f64) -> i64 {
    if f.is_finite() {
        f.trunc() as i64
    } else {
        0
    }
}

/// Turn a formatted cell string into a typed cell.
///
/// Integer text becomes [`CellValue::Int`], other float text becomes
/// [`CellValue::Float`], the empty string becomes [`CellValue::Empty`] and
/// everything else is kept as text. Surrounding whitespace is ignored when
/// parsing a number (`" 5"` is `Int(5)`), but non-numeric text keeps it.
/// `"3,5"` and `"1_000"` stay text.
pub fn numericise(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Empty;
    }
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return CellValue::Text(s.to_string());
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }
    if looks_like_float(trimmed) {
        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }
    }
    CellValue::Text(s.to_string())
}

/// Rejects the spellings `str::parse::<f64>` accepts but a spreadsheet value
/// should not turn into a number ("inf", "NaN", "infinity").
fn looks_like_float(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
