use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::influx::Series;
use crate::models::opentsdb::ExternalSeries;

use super::InternalQuery;

const TIME_COLUMN: &str = "time";

fn timestamp_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Expand one result table into a series per non-time column.
///
/// Every series carries the full merged tag filter, translated back to
/// external keys, regardless of which sub-query asked for that metric.
pub fn translate_series(series: &Series, query: &InternalQuery) -> Vec<ExternalSeries> {
    let time_idx = series
        .columns
        .iter()
        .position(|c| c == TIME_COLUMN)
        .unwrap_or(0);

    let tags: BTreeMap<String, String> = query
        .tag_filter
        .iter()
        .map(|(k, v)| {
            let external = query.tag_key_to_external.get(k).unwrap_or(k);
            (external.clone(), v.clone())
        })
        .collect();

    series
        .columns
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != time_idx)
        .map(|(idx, column)| {
            let metric = match query.field_to_metric.get(column) {
                Some(m) => m.clone(),
                None => {
                    tracing::debug!(column = %column, "result column has no metric mapping");
                    column.clone()
                }
            };
            let dps = series
                .values
                .iter()
                .filter_map(|row| {
                    let ts = row.get(time_idx).and_then(timestamp_key)?;
                    Some((ts, row.get(idx).cloned().unwrap_or(Value::Null)))
                })
                .collect();
            ExternalSeries {
                metric,
                tags: tags.clone(),
                aggregate_tags: Vec::new(),
                dps,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query() -> InternalQuery {
        InternalQuery {
            fields: vec!["usage_user".into(), "usage_system".into()],
            tag_filter: BTreeMap::from([
                ("hostname".to_string(), "a".to_string()),
                ("dc".to_string(), "eu".to_string()),
            ]),
            field_to_metric: BTreeMap::from([
                ("usage_user".to_string(), "sys.cpu.user".to_string()),
                ("usage_system".to_string(), "sys.cpu.system".to_string()),
            ]),
            tag_key_to_external: BTreeMap::from([
                ("hostname".to_string(), "host".to_string()),
                ("dc".to_string(), "dc".to_string()),
            ]),
            ..Default::default()
        }
    }

    fn table(columns: &[&str], values: Vec<Vec<Value>>) -> Series {
        Series {
            name: "cpu".into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            values,
            ..Default::default()
        }
    }

    #[test]
    fn one_series_per_value_column() {
        let t = table(
            &["time", "usage_user", "usage_system"],
            vec![
                vec![json!(1609459200), json!(0.5), json!(0.1)],
                vec![json!(1609459260), json!(0.7), json!(0.2)],
            ],
        );
        let out = translate_series(&t, &query());
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].metric, "sys.cpu.user");
        assert_eq!(out[0].dps["1609459200"], json!(0.5));
        assert_eq!(out[0].dps["1609459260"], json!(0.7));
        assert_eq!(out[1].metric, "sys.cpu.system");
        assert_eq!(out[1].dps["1609459260"], json!(0.2));

        for s in &out {
            assert_eq!(s.tags["host"], "a");
            assert_eq!(s.tags["dc"], "eu");
            assert!(s.aggregate_tags.is_empty());
        }
    }

    #[test]
    fn string_timestamps_are_used_verbatim() {
        let t = table(
            &["time", "usage_user"],
            vec![vec![json!("2021-01-01T00:00:00Z"), json!(1)]],
        );
        let out = translate_series(&t, &query());
        assert_eq!(out[0].dps["2021-01-01T00:00:00Z"], json!(1));
    }

    #[test]
    fn rows_without_time_are_skipped() {
        let t = table(
            &["time", "usage_user"],
            vec![vec![Value::Null, json!(1)], vec![json!(10), json!(2)]],
        );
        let out = translate_series(&t, &query());
        assert_eq!(out[0].dps.len(), 1);
        assert_eq!(out[0].dps["10"], json!(2));
    }

    #[test]
    fn serializes_external_shape() {
        let t = table(&["time", "usage_user"], vec![vec![json!(5), json!(1.5)]]);
        let out = translate_series(&t, &query());
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(
            v,
            json!([{
                "metric": "sys.cpu.user",
                "tags": {"dc": "eu", "host": "a"},
                "aggregateTags": [],
                "dps": {"5": 1.5},
            }])
        );
    }
}
