use std::fmt;
use std::marker::PhantomData;

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::coercion::coerce_count;

/// Column names read from the form-response sheet.
pub mod fields {
    pub const DATE: &str = "Date";
    pub const COUNTRY: &str = "Country";
    pub const NAME: &str = "Name";
    pub const SOURCE: &str = "Source";
    pub const CREATED: &str = "Created";
    pub const SENT_REQUESTS: &str = "Sent Requests";
    pub const CONNECTED: &str = "Connected";
    pub const TOTAL_REPLIES: &str = "Total replies";
    pub const POSITIVE_REPLIES: &str = "Positive Replies";
    pub const EVENTS_CREATED: &str = "Events Created";
}

/// Group key used when a row has no country, source or lead generator name.
pub const UNKNOWN_KEY: &str = "Unknown";

// ── CellValue ─────────────────────────────────────────────────────────────────

/// A single spreadsheet cell as delivered by the row source.
///
/// Serialized as plain JSON: `Empty` becomes `""`, numbers stay numbers and
/// text stays text, so a raw dump reproduces the source verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Integer count for this cell; see [`coerce_count`].
    pub fn as_count(&self) -> i64 {
        coerce_count(self)
    }

}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::String(s) if s.is_empty() => CellValue::Empty,
            Value::String(s) => CellValue::Text(s),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => CellValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<CellValue> for Value {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Empty => Value::String(String::new()),
            CellValue::Int(i) => Value::from(i),
            CellValue::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

// ── OrderedMap ────────────────────────────────────────────────────────────────

/// String-keyed map that keeps insertion order and serializes as a JSON object.
///
/// Used for rows (column order of the sheet) and for summary bucket maps,
/// whose key order is decided by the aggregator rather than by hashing.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries whose keys are already distinct, keeping their order.
    ///
    /// Skips the duplicate check of [`OrderedMap::insert`]; a repeated key
    /// would appear twice in the output.
    pub fn from_unique(entries: impl IntoIterator<Item = (String, V)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Insert or replace `key`. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((k, v)) = access.next_entry::<String, V>()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// One form submission: column name → cell, in sheet column order.
pub type Row = OrderedMap<CellValue>;

impl Row {
    /// Cell for `field`, treating a missing column as [`CellValue::Empty`].
    pub fn cell(&self, field: &str) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.get(field).unwrap_or(EMPTY)
    }

    /// Text of `field` as written, or [`UNKNOWN_KEY`] when empty or missing.
    ///
    /// Whitespace is significant: `"UA "` and `"UA"` are different groups.
    pub fn group_key(&self, field: &str) -> String {
        match self.cell(field) {
            CellValue::Text(s) if !s.is_empty() => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            _ => UNKNOWN_KEY.to_string(),
        }
    }
}

// ── MetricBucket ──────────────────────────────────────────────────────────────

/// The six funnel counters summed over a group of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricBucket {
    #[serde(rename = "Created")]
    pub created: i64,
    #[serde(rename = "SentRequests")]
    pub sent_requests: i64,
    #[serde(rename = "Connected")]
    pub connected: i64,
    #[serde(rename = "Replies")]
    pub replies: i64,
    #[serde(rename = "PositiveReplies")]
    pub positive_replies: i64,
    #[serde(rename = "Events")]
    pub events: i64,
}

impl MetricBucket {
    /// Coerced counters of a single row.
    pub fn from_row(row: &Row) -> Self {
        Self {
            created: row.cell(fields::CREATED).as_count(),
            sent_requests: row.cell(fields::SENT_REQUESTS).as_count(),
            connected: row.cell(fields::CONNECTED).as_count(),
            replies: row.cell(fields::TOTAL_REPLIES).as_count(),
            positive_replies: row.cell(fields::POSITIVE_REPLIES).as_count(),
            events: row.cell(fields::EVENTS_CREATED).as_count(),
        }
    }

    /// Add `other`'s counters to this bucket.
    pub fn add(&mut self, other: &MetricBucket) {
        self.created = self.created.saturating_add(other.created);
        self.sent_requests = self.sent_requests.saturating_add(other.sent_requests);
        self.connected = self.connected.saturating_add(other.connected);
        self.replies = self.replies.saturating_add(other.replies);
        self.positive_replies = self.positive_replies.saturating_add(other.positive_replies);
        self.events = self.events.saturating_add(other.events);
    }

    /// Events per created lead, in percent. `0.0` when nothing was created.
    pub fn conversion_rate(&self) -> f64 {
        crate::formatting::percentage(self.events as f64, self.created as f64, 2)
    }

    /// Positive replies per sent request, in percent.
    pub fn reply_rate(&self) -> f64 {
        crate::formatting::percentage(
            self.positive_replies as f64,
            self.sent_requests as f64,
            2,
        )
    }
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// Aggregated metrics written to the summary document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// UTC capture time, `YYYY-MM-DD HH:MM:SS UTC`.
    pub generated_at: String,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub totals: MetricBucket,
    /// ISO week key (`2024-W05`) → bucket, ordered by year then week.
    pub weekly: OrderedMap<MetricBucket>,
    /// `YYYY-MM` → bucket.
    pub monthly: OrderedMap<MetricBucket>,
    pub countries: OrderedMap<MetricBucket>,
    /// Lead `Source` → bucket.
    #[serde(default)]
    pub sources: OrderedMap<MetricBucket>,
    /// `YYYY-MM-DD` → bucket.
    #[serde(default)]
    pub daily: OrderedMap<MetricBucket>,
    /// Lead generator name → bucket.
    #[serde(default)]
    pub leaders: OrderedMap<MetricBucket>,
    #[serde(default)]
    pub rows_total: usize,
    /// Rows left out of every aggregate because their date did not parse.
    #[serde(default)]
    pub rows_skipped: usize,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
