//! Multi-context pod aggregation for podview
//!
//! This crate fans queries out over every configured context, projects raw
//! pods into listing summaries and detail manifests, and isolates failures
//! per context.

mod manifest;
mod service;
mod summary;

pub use manifest::normalize;
pub use service::{AggregationService, LOGS_PERMISSION_DENIED, DETAILS_PERMISSION_DENIED};
pub use summary::{summarize, timestamp_text};

pub use podview_types::{ContextSelector, PodDetails, PodSummary, Response};

#[cfg(test)]
mod fixtures;
