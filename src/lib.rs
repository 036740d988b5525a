pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod health_monitor;
pub mod models;
pub mod query_builder;
pub mod registry;
pub mod routing;
pub mod translate;

use axum::{Router, routing::get, routing::post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use executor::QueryExecutor;
use registry::BackendRegistry;
use routing::RoutingTable;

#[derive(Clone)]
pub struct AppState {
    pub routing: Arc<RoutingTable>,
    pub registry: Arc<BackendRegistry>,
    pub executor: QueryExecutor,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/query", post(handlers::query::query))
        .route("/healthz", get(handlers::health::healthz))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
