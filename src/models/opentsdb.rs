use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inbound `/api/query` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalQuery {
    /// Epoch timestamps of any precision. Kept as raw JSON numbers so values
    /// too large for i64 are reported as invalid timestamps, not bad JSON.
    pub start: serde_json::Number,
    pub end: serde_json::Number,
    #[serde(default)]
    pub queries: Vec<SubQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubQuery {
    pub metric: String,
    /// Accepted for compatibility; not applied to the backend query.
    #[serde(default)]
    pub aggregator: String,
    /// Sorted so tag merging is reproducible.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// One element of the `/api/query` response array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalSeries {
    pub metric: String,
    pub tags: BTreeMap<String, String>,
    #[serde(rename = "aggregateTags")]
    pub aggregate_tags: Vec<String>,
    pub dps: BTreeMap<String, serde_json::Value>,
}
