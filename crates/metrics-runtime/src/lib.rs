//! Runtime layer for sheet-metrics.
//!
//! Resolves credentials, talks to the spreadsheet API and drives the
//! fetch → dump → aggregate → summary pipeline.

pub mod credentials;
pub mod pipeline;
pub mod sheets;
pub mod source;

pub use metrics_core as core;
pub use metrics_data as data;
