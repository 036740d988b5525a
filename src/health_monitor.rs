use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::QueryBackend;
use crate::error::GatewayError;
use crate::registry::BackendRegistry;

/// Spawn the background liveness prober. It runs for the life of the process;
/// the first probe happens immediately.
pub fn spawn_health_monitor(
    registry: Arc<BackendRegistry>,
    backend: Arc<dyn QueryBackend>,
    every: Duration,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            probe_all(&registry, backend.as_ref(), every).await;
        }
    });
}

/// Ping every backend concurrently and record the outcome. Each flag is
/// stored atomically, so readers never wait on a probe. A ping that does not
/// answer within `limit` counts as dead.
pub async fn probe_all(registry: &BackendRegistry, backend: &dyn QueryBackend, limit: Duration) {
    let probes = registry.iter().map(|b| async move {
        let result = match tokio::time::timeout(limit, backend.ping(&b.url)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::BackendConnection {
                url: b.url.clone(),
                message: format!("ping timed out after {limit:?}"),
            }),
        };
        let alive = result.is_ok();
        let was_alive = b.set_alive(alive);
        match result {
            Ok(()) if !was_alive => {
                tracing::info!(backend = %b.name, url = %b.url, "backend is up");
            }
            Err(e) if was_alive => {
                tracing::warn!(backend = %b.name, "backend went down: {e}");
            }
            Err(e) => {
                tracing::debug!(backend = %b.name, "backend still down: {e}");
            }
            Ok(()) => {}
        }
    });
    join_all(probes).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::influx::InfluxResponse;
    use crate::registry::Backend;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct FakePing {
        up: Mutex<HashSet<String>>,
        hung: HashSet<String>,
    }

    impl FakePing {
        fn new(up: &[&str]) -> Self {
            Self {
                up: Mutex::new(up.iter().map(|s| s.to_string()).collect()),
                hung: HashSet::new(),
            }
        }
    }

    #[async_trait]
    impl QueryBackend for FakePing {
        async fn ping(&self, url: &str) -> Result<()> {
            if self.hung.contains(url) {
                return std::future::pending().await;
            }
            if self.up.lock().unwrap().contains(url) {
                Ok(())
            } else {
                Err(GatewayError::BackendConnection {
                    url: url.to_string(),
                    message: "refused".into(),
                })
            }
        }

        async fn query(&self, _: &str, _: &str, _: &str) -> Result<InfluxResponse> {
            unreachable!("health monitor never queries")
        }
    }

    const LIMIT: Duration = Duration::from_secs(1);

    fn registry() -> BackendRegistry {
        BackendRegistry::new(vec![
            Backend::new("a", "http://a"),
            Backend::new("b", "http://b"),
        ])
    }

    #[tokio::test]
    async fn probe_marks_liveness() {
        let reg = registry();
        let fake = FakePing::new(&["http://a"]);
        probe_all(&reg, &fake, LIMIT).await;
        assert!(reg.get("a").unwrap().is_alive());
        assert!(!reg.get("b").unwrap().is_alive());
    }

    #[tokio::test]
    async fn probe_flips_back_when_backend_fails() {
        let reg = registry();
        let fake = FakePing::new(&["http://a", "http://b"]);
        probe_all(&reg, &fake, LIMIT).await;
        assert!(reg.get("b").unwrap().is_alive());

        fake.up.lock().unwrap().remove("http://b");
        probe_all(&reg, &fake, LIMIT).await;
        assert!(reg.get("a").unwrap().is_alive());
        assert!(!reg.get("b").unwrap().is_alive());
    }

    #[tokio::test]
    async fn spawned_monitor_probes_immediately() {
        let reg = Arc::new(registry());
        let fake: Arc<dyn QueryBackend> = Arc::new(FakePing::new(&["http://a"]));
        spawn_health_monitor(reg.clone(), fake, Duration::from_secs(2));
        for _ in 0..50 {
            if reg.get("a").unwrap().is_alive() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("monitor never marked backend alive");
    }

    #[tokio::test]
    async fn hung_backend_does_not_stall_monitor() {
        let reg = Arc::new(BackendRegistry::new(vec![
            Backend::new("b", "http://b"),
            Backend::new("hung", "http://hung"),
        ]));
        reg.get("hung").unwrap().set_alive(true);
        let mut fake = FakePing::new(&["http://b"]);
        fake.hung.insert("http://hung".to_string());
        let fake = Arc::new(fake);

        spawn_health_monitor(reg.clone(), fake.clone(), Duration::from_millis(20));
        for _ in 0..50 {
            if reg.get("b").unwrap().is_alive() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(reg.get("b").unwrap().is_alive());

        fake.up.lock().unwrap().remove("http://b");
        for _ in 0..50 {
            if !reg.get("b").unwrap().is_alive() && !reg.get("hung").unwrap().is_alive() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("liveness stopped updating behind a hung ping");
    }
}
