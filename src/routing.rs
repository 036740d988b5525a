use std::collections::BTreeMap;

use crate::config::MappingConfig;
use crate::error::{GatewayError, Result};
use crate::registry::BackendRegistry;

/// Binds external metric names to a backend database/measurement.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub name: String,
    pub database: String,
    pub measurement: String,
    pub backends: Vec<String>,
    pub metric_map: BTreeMap<String, String>,
    pub tag_map: BTreeMap<String, String>,
}

impl From<&MappingConfig> for Mapping {
    fn from(c: &MappingConfig) -> Self {
        Self {
            name: c.name.clone(),
            database: c.database.clone(),
            measurement: c.measurement.clone(),
            backends: c.backends.clone(),
            metric_map: c.metric_map.clone(),
            tag_map: c.tag_map.clone(),
        }
    }
}

/// Outcome of resolving one external metric.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// Position of the winning mapping in the table; identifies it.
    pub mapping_index: usize,
    pub mapping: &'a Mapping,
    pub field: &'a str,
    /// Alive candidate URLs in declared order. `[0]` is primary, `[1]` secondary.
    pub urls: Vec<String>,
}

impl Resolution<'_> {
    pub fn primary(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }

    pub fn secondary(&self) -> Option<&str> {
        self.urls.get(1).map(String::as_str)
    }
}

/// Ordered mappings; lookup is first-match. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    mappings: Vec<Mapping>,
}

impl RoutingTable {
    pub fn new(mappings: Vec<Mapping>) -> Self {
        Self { mappings }
    }

    pub fn from_config(configs: &[MappingConfig]) -> Self {
        Self::new(configs.iter().map(Mapping::from).collect())
    }

    pub fn resolve(&self, metric: &str, registry: &BackendRegistry) -> Result<Resolution<'_>> {
        let (mapping_index, mapping, field) = self
            .mappings
            .iter()
            .enumerate()
            .find_map(|(i, m)| m.metric_map.get(metric).map(|f| (i, m, f.as_str())))
            .ok_or_else(|| GatewayError::UnknownMetric(metric.to_string()))?;

        let urls = registry.alive_urls(&mapping.backends);
        if urls.is_empty() {
            tracing::debug!(mapping = %mapping.name, "no alive candidate backends");
        }

        Ok(Resolution {
            mapping_index,
            mapping,
            field,
            urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Backend;

    fn mapping(name: &str, db: &str, metric: &str, field: &str, backends: &[&str]) -> Mapping {
        Mapping {
            name: name.into(),
            database: db.into(),
            measurement: format!("{name}_m"),
            backends: backends.iter().map(|s| s.to_string()).collect(),
            metric_map: BTreeMap::from([(metric.to_string(), field.to_string())]),
            tag_map: BTreeMap::new(),
        }
    }

    fn registry(alive: [bool; 3]) -> BackendRegistry {
        let reg = BackendRegistry::new(vec![
            Backend::new("B1", "http://b1"),
            Backend::new("B2", "http://b2"),
            Backend::new("B3", "http://b3"),
        ]);
        for (name, up) in ["B1", "B2", "B3"].iter().zip(alive) {
            reg.get(name).unwrap().set_alive(up);
        }
        reg
    }

    #[test]
    fn first_match_wins() {
        let table = RoutingTable::new(vec![
            mapping("first", "db1", "sys.cpu", "usage", &["B1"]),
            mapping("second", "db2", "sys.cpu", "other", &["B1"]),
        ]);
        let reg = registry([true, true, true]);
        let res = table.resolve("sys.cpu", &reg).unwrap();
        assert_eq!(res.mapping_index, 0);
        assert_eq!(res.mapping.database, "db1");
        assert_eq!(res.field, "usage");
    }

    #[test]
    fn unknown_metric() {
        let table = RoutingTable::new(vec![mapping("m", "db", "a", "b", &["B1"])]);
        let reg = registry([true, true, true]);
        assert!(matches!(
            table.resolve("missing", &reg),
            Err(GatewayError::UnknownMetric(m)) if m == "missing"
        ));
    }

    #[test]
    fn primary_and_secondary_skip_dead() {
        let table = RoutingTable::new(vec![mapping("m", "db", "a", "b", &["B1", "B2", "B3"])]);
        let reg = registry([false, true, true]);
        let res = table.resolve("a", &reg).unwrap();
        assert_eq!(res.primary(), Some("http://b2"));
        assert_eq!(res.secondary(), Some("http://b3"));
    }

    #[test]
    fn candidate_order_is_declared_order() {
        let table = RoutingTable::new(vec![mapping("m", "db", "a", "b", &["B3", "B1"])]);
        let reg = registry([true, true, true]);
        let res = table.resolve("a", &reg).unwrap();
        assert_eq!(res.urls, vec!["http://b3", "http://b1"]);
    }

    #[test]
    fn all_dead_has_no_primary() {
        let table = RoutingTable::new(vec![mapping("m", "db", "a", "b", &["B1", "B2", "B3"])]);
        let reg = registry([false, false, false]);
        let res = table.resolve("a", &reg).unwrap();
        assert!(res.primary().is_none());
        assert!(res.secondary().is_none());
    }
}
