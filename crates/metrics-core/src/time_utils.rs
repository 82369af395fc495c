use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::models::CellValue;

/// Accepted `Date` column layouts, tried in order.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y"];

/// Timestamp layout of `last_updated` and `generated_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

// ── Date parsing ──────────────────────────────────────────────────────────────

/// Parse a `Date` cell into a calendar date.
///
/// Text is tried against `DD/MM/YYYY`, `YYYY-MM-DD` and `DD.MM.YYYY` in that
/// order. Empty cells, numbers and unmatched text give `None`.
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Text(s) => parse_date_str(s),
        _ => None,
    }
}

/// String form of [`parse_date`].
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

// ── Period keys ───────────────────────────────────────────────────────────────

/// ISO-8601 week key, e.g. `"2024-W05"`.
///
/// The year is the ISO week-numbering year, which differs from the calendar
/// year for some days around New Year (2024-12-30 is `"2025-W01"`).
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Calendar month key, e.g. `"2024-02"`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

/// Calendar day key, e.g. `"2024-02-01"`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Numeric `(year, week)` of a week key. Accepts unpadded weeks (`"2024-W1"`).
///
/// Malformed keys sort first as `(i32::MIN, 0)`.
///
/// ```
/// use metrics_core::time_utils::week_key_order;
///
/// let mut keys = vec!["2024-W52", "2024-W1", "2023-W52"];
/// keys.sort_by_key(|k| week_key_order(k));
/// assert_eq!(keys, vec!["2023-W52", "2024-W1", "2024-W52"]);
/// ```
pub fn week_key_order(key: &str) -> (i32, u32) {
    key.split_once("-W")
        .and_then(|(year, week)| Some((year.parse().ok()?, week.parse().ok()?)))
        .unwrap_or((i32::MIN, 0))
}

// ── Timestamps ────────────────────────────────────────────────────────────────

/// Render `dt` as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_utc_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// The current time as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn utc_timestamp_now() -> String {
    format_utc_timestamp(&Utc::now())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── parse_date ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_date_all_formats_agree() {
        let expected = Some(ymd(2024, 2, 1));
        assert_eq!(parse_date_str("01/02/2024"), expected);
        assert_eq!(parse_date_str("2024-02-01"), expected);
        assert_eq!(parse_date_str("01.02.2024"), expected);
    }

    #[test]
    fn test_parse_date_is_day_first() {
        assert_eq!(parse_date_str("13/01/2024"), Some(ymd(2024, 1, 13)));
        assert_eq!(parse_date_str("01/13/2024"), None);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date_str("not-a-date"), None);
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("   "), None);
        assert_eq!(parse_date_str("31/02/2024"), None);
    }

    #[test]
    fn test_parse_date_trims_whitespace() {
        assert_eq!(parse_date_str(" 2024-02-01 "), Some(ymd(2024, 2, 1)));
    }

    #[test]
    fn test_parse_date_cell_variants() {
        assert_eq!(
            parse_date(&CellValue::Text("02/01/2024".into())),
            Some(ymd(2024, 1, 2))
        );
        assert_eq!(parse_date(&CellValue::Empty), None);
        assert_eq!(parse_date(&CellValue::Int(45292)), None);
    }

    // ── Period keys ──────────────────────────────────────────────────────────

    #[test]
    fn test_iso_week_key_pads_week() {
        assert_eq!(iso_week_key(ymd(2024, 2, 1)), "2024-W05");
    }

    #[test]
    fn test_iso_week_key_year_boundaries() {
        // Monday 30 Dec 2024 belongs to week 1 of 2025.
        assert_eq!(iso_week_key(ymd(2024, 12, 30)), "2025-W01");
        // Friday 1 Jan 2021 belongs to week 53 of 2020.
        assert_eq!(iso_week_key(ymd(2021, 1, 1)), "2020-W53");
        assert_eq!(iso_week_key(ymd(2024, 1, 1)), "2024-W01");
    }

    #[test]
    fn test_month_and_day_keys() {
        assert_eq!(month_key(ymd(2024, 3, 9)), "2024-03");
        assert_eq!(day_key(ymd(2024, 3, 9)), "2024-03-09");
    }

    #[test]
    fn test_week_key_order_sorts_numerically() {
        let mut keys = vec![
            "2024-W52".to_string(),
            "2024-W1".to_string(),
            "2023-W52".to_string(),
        ];
        keys.sort_by_key(|k| week_key_order(k));
        assert_eq!(keys, vec!["2023-W52", "2024-W1", "2024-W52"]);
    }

    #[test]
    fn test_week_key_order_malformed_sorts_first() {
        assert_eq!(week_key_order("garbage"), (i32::MIN, 0));
        assert_eq!(week_key_order("2024-W09"), (2024, 9));
    }

    // ── Timestamps ───────────────────────────────────────────────────────────

    #[test]
    fn test_format_utc_timestamp() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 5, 7, 3, 9).unwrap();
        assert_eq!(format_utc_timestamp(&dt), "2024-01-05 07:03:09 UTC");
    }

    #[test]
    fn test_utc_timestamp_now_shape() {
        let now = utc_timestamp_now();
        assert_eq!(now.len(), "2024-01-05 07:03:09 UTC".len());
        assert!(now.ends_with(" UTC"));
    }
}
