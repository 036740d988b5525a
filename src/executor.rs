use std::sync::Arc;

use crate::backend::QueryBackend;
use crate::error::{GatewayError, Result};
use crate::models::influx::StatementResult;
use crate::query_builder::build_select;
use crate::translate::InternalQuery;

/// Runs an [`InternalQuery`] against its primary backend, failing over to the
/// secondary at most once.
#[derive(Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn QueryBackend>,
}

impl QueryExecutor {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self { backend }
    }

    /// Execute and swallow failures: errors are logged and yield no results.
    pub async fn execute(&self, query: &InternalQuery) -> Vec<StatementResult> {
        match self.try_execute(query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(mapping = %query.mapping, code = e.code(), "query failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn try_execute(&self, query: &InternalQuery) -> Result<Vec<StatementResult>> {
        let Some(primary) = query.primary_url.as_deref() else {
            return Err(GatewayError::NoBackendAvailable(query.mapping.clone()));
        };
        let statement = build_select(query);
        tracing::debug!(database = %query.database, "{statement}");

        let candidates = [Some(primary), query.secondary_url.as_deref()];
        let mut last_error = None;
        for (attempt, url) in candidates.into_iter().enumerate() {
            let Some(url) = url else {
                tracing::warn!(mapping = %query.mapping, "no secondary backend to fail over to");
                return Err(GatewayError::NoBackendAvailable(query.mapping.clone()));
            };
            if attempt > 0 {
                tracing::info!(url, "querying secondary backend");
            }
            match self.backend.query(url, &query.database, &statement).await {
                Ok(resp) => return Ok(resp.results),
                Err(e) => {
                    tracing::warn!(url, attempt, "backend query failed: {e}");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| GatewayError::NoBackendAvailable(query.mapping.clone())))
    }
}
