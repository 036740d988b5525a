//! Conversion between the external metric/tag query protocol and the
//! backend's measurement/field model.
//!
//! [`request::translate_request`] folds a multi-metric [`ExternalQuery`] into
//! one [`InternalQuery`], and [`response::translate_series`] expands a backend
//! result table back into one [`ExternalSeries`] per value column. Both
//! directions go through the name maps recorded on the [`InternalQuery`], so
//! metric and tag names round-trip exactly.
//!
//! [`ExternalQuery`]: crate::models::opentsdb::ExternalQuery
//! [`ExternalSeries`]: crate::models::opentsdb::ExternalSeries

pub mod request;
pub mod response;

use std::collections::BTreeMap;

pub use request::{normalize_json_timestamp, normalize_timestamp, translate_request};
pub use response::translate_series;

/// Request-scoped query against a single mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InternalQuery {
    /// Fields to select, in first-requested order, without duplicates.
    pub fields: Vec<String>,
    /// Internal tag key -> required value.
    pub tag_filter: BTreeMap<String, String>,
    /// Internal field name -> external metric name.
    pub field_to_metric: BTreeMap<String, String>,
    /// Internal tag key -> external tag key.
    pub tag_key_to_external: BTreeMap<String, String>,
    /// Nanosecond epoch bounds, both exclusive.
    pub start: i64,
    pub end: i64,
    pub mapping: String,
    pub database: String,
    pub measurement: String,
    pub primary_url: Option<String>,
    pub secondary_url: Option<String>,
}
