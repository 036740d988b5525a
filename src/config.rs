use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::GatewayError;

/// Top-level config loaded from `tsgate.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Pooled keep-alive connections to backends are dropped after sitting
    /// idle this many seconds.
    #[serde(default = "default_backend_pool_idle")]
    pub backend_pool_idle_secs: u64,
    #[serde(default = "default_health_interval")]
    pub health_check_interval_secs: u64,
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    pub name: String,
    pub database: String,
    pub measurement: String,
    /// Candidate backend names, in preference order.
    pub backends: Vec<String>,
    /// External metric name -> internal field name.
    pub metric_map: BTreeMap<String, String>,
    /// External tag key -> internal tag key.
    #[serde(default)]
    pub tag_map: BTreeMap<String, String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:4242".to_string()
}

fn default_backend_pool_idle() -> u64 {
    60
}

fn default_health_interval() -> u64 {
    2
}

impl GatewayConfig {
    /// Load and validate config from a TOML file. A missing file is an error,
    /// nothing can be routed without mappings.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        let config = Self::from_toml(&contents)?;
        tracing::info!(
            "loaded config from {} ({} backends, {} mappings)",
            path.display(),
            config.backends.len(),
            config.mappings.len()
        );
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, GatewayError> {
        let config: GatewayConfig =
            toml::from_str(contents).map_err(|e| GatewayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        let mut names = HashSet::new();
        for backend in &self.backends {
            if !names.insert(backend.name.as_str()) {
                return Err(GatewayError::Config(format!(
                    "duplicate backend name: {}",
                    backend.name
                )));
            }
        }

        for mapping in &self.mappings {
            if mapping.metric_map.is_empty() {
                return Err(GatewayError::Config(format!(
                    "mapping {} has an empty metric_map",
                    mapping.name
                )));
            }
            if let Some(unknown) = mapping
                .backends
                .iter()
                .find(|b| !names.contains(b.as_str()))
            {
                return Err(GatewayError::Config(format!(
                    "mapping {} references unknown backend {unknown}",
                    mapping.name
                )));
            }
        }
        Ok(())
    }
}
