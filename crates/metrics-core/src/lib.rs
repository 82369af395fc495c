//! Core types for sheet-metrics.
//!
//! Cell values and rows as delivered by the spreadsheet, metric buckets and
//! the summary document, plus the total coercion and date-parsing functions
//! everything else builds on.

pub mod coercion;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{MetricsError, Result};
