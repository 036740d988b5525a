use async_trait::async_trait;
use std::time::Duration;

use crate::error::{GatewayError, Result};
use crate::models::influx::InfluxResponse;

/// Transport to a time-series backend. Implemented over HTTP in production and
/// faked in tests.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Lightweight liveness check, no query payload.
    async fn ping(&self, url: &str) -> Result<()>;

    /// Run one statement against `database`, timestamps in epoch seconds.
    async fn query(&self, url: &str, database: &str, statement: &str) -> Result<InfluxResponse>;
}

/// HTTP client for InfluxDB 1.x compatible `/ping` and `/query` endpoints.
#[derive(Clone)]
pub struct InfluxHttpClient {
    http: reqwest::Client,
}

impl InfluxHttpClient {
    pub fn new(pool_idle: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(pool_idle)
            .build()
            .map_err(|e| GatewayError::Config(format!("building http client: {e}")))?;
        Ok(Self { http })
    }
}

fn connection_error(url: &str, e: reqwest::Error) -> GatewayError {
    GatewayError::BackendConnection {
        url: url.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl QueryBackend for InfluxHttpClient {
    async fn ping(&self, url: &str) -> Result<()> {
        let resp = self
            .http
            .get(format!("{url}/ping"))
            .send()
            .await
            .map_err(|e| connection_error(url, e))?;
        if !resp.status().is_success() {
            return Err(GatewayError::BackendConnection {
                url: url.to_string(),
                message: format!("ping returned {}", resp.status()),
            });
        }
        Ok(())
    }

    async fn query(&self, url: &str, database: &str, statement: &str) -> Result<InfluxResponse> {
        let resp = self
            .http
            .get(format!("{url}/query"))
            .query(&[("db", database), ("q", statement), ("epoch", "s")])
            .send()
            .await
            .map_err(|e| connection_error(url, e))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| connection_error(url, e))?;
        let parsed: InfluxResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(GatewayError::BackendQuery {
                    url: url.to_string(),
                    message: format!("status {status}, undecodable body: {e}"),
                });
            }
        };

        if let Some(err) = parsed.error() {
            return Err(GatewayError::BackendQuery {
                url: url.to_string(),
                message: err.to_string(),
            });
        }
        if !status.is_success() {
            return Err(GatewayError::BackendQuery {
                url: url.to_string(),
                message: format!("status {status}"),
            });
        }
        Ok(parsed)
    }
}
