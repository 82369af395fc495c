//! Data layer for sheet-metrics.
//!
//! Aggregates form-response rows into a summary, writes the raw dump and
//! summary documents, and reads raw dumps back for offline runs.

pub mod aggregator;
pub mod reader;
pub mod report;
pub mod writer;

pub use metrics_core as core;
