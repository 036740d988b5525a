use crate::error::{GatewayError, Result};
use crate::models::opentsdb::ExternalQuery;
use crate::registry::BackendRegistry;
use crate::routing::RoutingTable;

use super::InternalQuery;

const EPOCH_DIGITS: u32 = 19;

/// Scale an epoch timestamp of any precision to 19 digits (nanoseconds for
/// present-day times): `t * 10^(19 - digits(t))`.
pub fn normalize_timestamp(t: i64) -> Result<i64> {
    if t < 0 {
        return Err(GatewayError::InvalidTimestamp(t.to_string()));
    }
    let digits = if t == 0 { 1 } else { t.ilog10() + 1 };
    if digits > EPOCH_DIGITS {
        return Err(GatewayError::InvalidTimestamp(t.to_string()));
    }
    10i64
        .checked_pow(EPOCH_DIGITS - digits)
        .and_then(|scale| t.checked_mul(scale))
        .ok_or_else(|| GatewayError::InvalidTimestamp(t.to_string()))
}

/// Normalize a timestamp as it arrived in the request body. Anything that is
/// not an integer representable as i64 is rejected.
pub fn normalize_json_timestamp(t: &serde_json::Number) -> Result<i64> {
    let t = t
        .as_i64()
        .ok_or_else(|| GatewayError::InvalidTimestamp(t.to_string()))?;
    normalize_timestamp(t)
}

/// Fold every sub-query into one [`InternalQuery`].
///
/// Sub-queries are applied in request order and tags in key order; a tag key
/// set by a later sub-query overwrites an earlier one. All sub-queries must
/// resolve to the same mapping.
pub fn translate_request(
    query: &ExternalQuery,
    routing: &RoutingTable,
    registry: &BackendRegistry,
) -> Result<InternalQuery> {
    if query.queries.is_empty() {
        return Err(GatewayError::EmptyQuery);
    }

    let mut iq = InternalQuery {
        start: normalize_json_timestamp(&query.start)?,
        end: normalize_json_timestamp(&query.end)?,
        ..Default::default()
    };
    let mut mapping_index = None;

    for sub in &query.queries {
        let res = routing.resolve(&sub.metric, registry)?;
        if mapping_index.is_some_and(|i| i != res.mapping_index) {
            return Err(GatewayError::MixedMappings {
                first: iq.mapping,
                second: res.mapping.name.clone(),
            });
        }
        mapping_index = Some(res.mapping_index);

        iq.mapping = res.mapping.name.clone();
        iq.database = res.mapping.database.clone();
        iq.measurement = res.mapping.measurement.clone();
        iq.primary_url = res.primary().map(str::to_string);
        iq.secondary_url = res.secondary().map(str::to_string);

        if !iq.fields.iter().any(|f| f == res.field) {
            iq.fields.push(res.field.to_string());
        }
        iq.field_to_metric
            .insert(res.field.to_string(), sub.metric.clone());

        for (key, value) in &sub.tags {
            let internal = res.mapping.tag_map.get(key).unwrap_or(key);
            iq.tag_filter.insert(internal.clone(), value.clone());
            iq.tag_key_to_external.insert(internal.clone(), key.clone());
        }
    }

    tracing::debug!(
        mapping = %iq.mapping,
        fields = ?iq.fields,
        "translated request"
    );
    Ok(iq)
}
