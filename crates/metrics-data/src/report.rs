//! Plain-text overview of a [`Summary`] for the status output.

use metrics_core::formatting::{format_count, format_percent};
use metrics_core::models::{MetricBucket, OrderedMap, Summary};

/// Countries listed in the overview.
const TOP_COUNTRIES: usize = 5;

/// Lines describing `summary`: covered range, funnel totals and the largest
/// countries by created leads.
pub fn summary_lines(summary: &Summary) -> Vec<String> {
    let mut lines = Vec::new();

    match (summary.min_date, summary.max_date) {
        (Some(min), Some(max)) => lines.push(format!("Period: {} → {}", min, max)),
        _ => lines.push("Period: no dated rows".to_string()),
    }
    lines.push(format!(
        "Rows: {} ({} without a parseable date)",
        summary.rows_total, summary.rows_skipped
    ));
    lines.push(funnel_line("Totals", &summary.totals));

    for (country, bucket) in top_by_created(&summary.countries, TOP_COUNTRIES) {
        lines.push(funnel_line(country, bucket));
    }

    lines
}

fn funnel_line(label: &str, b: &MetricBucket) -> String {
    format!(
        "{}: created {}, sent {}, connected {}, replies {}, positive {}, events {} ({} conversion, {} reply rate)",
        label,
        format_count(b.created),
        format_count(b.sent_requests),
        format_count(b.connected),
        format_count(b.replies),
        format_count(b.positive_replies),
        format_count(b.events),
        format_percent(b.conversion_rate()),
        format_percent(b.reply_rate()),
    )
}

/// The `n` groups with the most created leads; ties keep key order.
fn top_by_created(map: &OrderedMap<MetricBucket>, n: usize) -> Vec<(&str, &MetricBucket)> {
    let mut entries: Vec<(&str, &MetricBucket)> = map.iter().collect();
    entries.sort_by(|a, b| b.1.created.cmp(&a.1.created));
    entries.truncate(n);
    entries
}

// ── Tests ──────────────────────────────────────────────────────────────────────
