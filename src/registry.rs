use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::BackendConfig;

/// A backend endpoint. `alive` is written only by the health monitor and read
/// lock-free by request handlers.
#[derive(Debug)]
pub struct Backend {
    pub name: String,
    pub url: String,
    alive: AtomicBool,
}

impl Backend {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            alive: AtomicBool::new(false),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Store the new liveness and return the previous value.
    pub fn set_alive(&self, alive: bool) -> bool {
        self.alive.swap(alive, Ordering::AcqRel)
    }
}

/// Point-in-time view of one backend, used by `/healthz`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackendStatus {
    pub name: String,
    pub url: String,
    pub alive: bool,
}

/// The fixed set of backends known at startup. Backends are never added or
/// removed after construction; only their liveness changes.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: Vec<Backend>,
    by_name: HashMap<String, usize>,
}

impl BackendRegistry {
    pub fn new(backends: Vec<Backend>) -> Self {
        let by_name = backends
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();
        Self { backends, by_name }
    }

    pub fn from_config(configs: &[BackendConfig]) -> Self {
        Self::new(
            configs
                .iter()
                .map(|c| Backend::new(&c.name, c.url.trim_end_matches('/')))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&Backend> {
        self.by_name.get(name).map(|&i| &self.backends[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Backend> {
        self.backends.iter()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// URLs of the named backends that are currently alive, in the order given.
    pub fn alive_urls<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        names
            .into_iter()
            .filter_map(|name| self.get(name))
            .filter(|b| b.is_alive())
            .map(|b| b.url.clone())
            .collect()
    }

    pub fn snapshot(&self) -> Vec<BackendStatus> {
        self.backends
            .iter()
            .map(|b| BackendStatus {
                name: b.name.clone(),
                url: b.url.clone(),
                alive: b.is_alive(),
            })
            .collect()
    }
}
