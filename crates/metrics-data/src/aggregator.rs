//! Single-pass aggregation of form responses into a [`Summary`].

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use metrics_core::models::{fields, MetricBucket, OrderedMap, Row, Summary};
use metrics_core::time_utils::{
    day_key, format_utc_timestamp, iso_week_key, month_key, parse_date, week_key_order,
};
use tracing::debug;

// ── DateRange ─────────────────────────────────────────────────────────────────

/// Earliest and latest dates seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DateRange {
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
}

impl DateRange {
    fn observe(&mut self, date: NaiveDate) {
        match self.min {
            Some(min) if date >= min => {}
            _ => self.min = Some(date),
        }
        match self.max {
            Some(max) if date <= max => {}
            _ => self.max = Some(date),
        }
    }
}

// ── Accumulator ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Accumulator {
    range: DateRange,
    totals: MetricBucket,
    weekly: HashMap<String, MetricBucket>,
    // BTreeMap for automatically sorted keys.
    monthly: BTreeMap<String, MetricBucket>,
    countries: BTreeMap<String, MetricBucket>,
    sources: BTreeMap<String, MetricBucket>,
    daily: BTreeMap<String, MetricBucket>,
    leaders: BTreeMap<String, MetricBucket>,
    rows_total: usize,
    rows_skipped: usize,
}

impl Accumulator {
    fn add_row(&mut self, row: &Row) {
        self.rows_total += 1;

        let Some(date) = parse_date(row.cell(fields::DATE)) else {
            self.rows_skipped += 1;
            return;
        };

        self.range.observe(date);

        let values = MetricBucket::from_row(row);
        self.totals.add(&values);
        self.weekly
            .entry(iso_week_key(date))
            .or_default()
            .add(&values);
        self.monthly.entry(month_key(date)).or_default().add(&values);
        self.daily.entry(day_key(date)).or_default().add(&values);
        self.countries
            .entry(row.group_key(fields::COUNTRY))
            .or_default()
            .add(&values);
        self.sources
            .entry(row.group_key(fields::SOURCE))
            .or_default()
            .add(&values);
        self.leaders
            .entry(row.group_key(fields::NAME))
            .or_default()
            .add(&values);
    }

    fn finish(self, generated_at: DateTime<Utc>) -> Summary {
        let mut weekly: Vec<(String, MetricBucket)> = self.weekly.into_iter().collect();
        weekly.sort_by_key(|(key, _)| week_key_order(key));

        Summary {
            generated_at: format_utc_timestamp(&generated_at),
            min_date: self.range.min,
            max_date: self.range.max,
            totals: self.totals,
            weekly: OrderedMap::from_unique(weekly),
            monthly: OrderedMap::from_unique(self.monthly),
            countries: OrderedMap::from_unique(self.countries),
            sources: OrderedMap::from_unique(self.sources),
            daily: OrderedMap::from_unique(self.daily),
            leaders: OrderedMap::from_unique(self.leaders),
            rows_total: self.rows_total,
            rows_skipped: self.rows_skipped,
        }
    }
}

// ── SummaryAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that turns raw rows into a [`Summary`].
pub struct SummaryAggregator;

impl SummaryAggregator {
    /// Aggregate `rows`, stamping the summary with the current UTC time.
    ///
    /// Never fails: unparseable numbers count as zero, and rows whose `Date`
    /// does not parse are left out of every bucket, `totals` included.
    pub fn aggregate(rows: &[Row]) -> Summary {
        Self::aggregate_at(rows, Utc::now())
    }

    /// Same as [`SummaryAggregator::aggregate`] with an explicit generation time.
    pub fn aggregate_at(rows: &[Row], generated_at: DateTime<Utc>) -> Summary {
        let mut acc = Accumulator::default();
        for row in rows {
            acc.add_row(row);
        }

        debug!(
            "Aggregated {} rows ({} without a parseable date) into {} weeks, {} months, {} countries, {} sources",
            acc.rows_total,
            acc.rows_skipped,
            acc.weekly.len(),
            acc.monthly.len(),
            acc.countries.len(),
            acc.sources.len(),
        );

        acc.finish(generated_at)
    }

    /// Sum of the buckets in `map`.
    pub fn sum_buckets(map: &OrderedMap<MetricBucket>) -> MetricBucket {
        let mut total = MetricBucket::default();
        for bucket in map.values() {
            total.add(bucket);
        }
        total
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
