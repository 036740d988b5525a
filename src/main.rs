use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use tsgate::AppState;
use tsgate::backend::{InfluxHttpClient, QueryBackend};
use tsgate::config::GatewayConfig;
use tsgate::executor::QueryExecutor;
use tsgate::health_monitor;
use tsgate::registry::BackendRegistry;
use tsgate::routing::RoutingTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tsgate=info,tower_http=info")),
        )
        .init();

    let config_path =
        std::env::var("TSGATE_CONFIG").unwrap_or_else(|_| "tsgate.toml".to_string());
    let config = GatewayConfig::load(&config_path)?;

    let registry = Arc::new(BackendRegistry::from_config(&config.backends));
    let routing = Arc::new(RoutingTable::from_config(&config.mappings));
    let backend: Arc<dyn QueryBackend> = Arc::new(InfluxHttpClient::new(Duration::from_secs(
        config.backend_pool_idle_secs,
    ))?);

    tracing::info!("monitoring {} backends", registry.len());
    health_monitor::spawn_health_monitor(
        registry.clone(),
        backend.clone(),
        Duration::from_secs(config.health_check_interval_secs.max(1)),
    );

    let state = AppState {
        routing,
        registry,
        executor: QueryExecutor::new(backend),
    };
    let app = tsgate::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("tsgate listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
