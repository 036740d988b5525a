use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::error::GatewayError;
use crate::models::opentsdb::ExternalQuery;
use crate::translate::{translate_request, translate_series};

/// `POST /api/query`: translate, execute with failover, translate back.
///
/// Request-side errors get a 4xx. Backend trouble, any result that is not
/// exactly one table, and a table with no value columns yield an empty 200
/// and a log line.
///
/// A single table with several value columns is answered with one series per
/// column. This is looser than a one-column-only rule: a request for several
/// metrics of the same measurement selects several fields, and dropping that
/// answer would make such requests always come back empty.
pub async fn query(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let external: ExternalQuery = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("malformed query body: {e}");
        GatewayError::MalformedRequestBody(e.to_string())
    })?;

    let internal = translate_request(&external, &state.routing, &state.registry).map_err(|e| {
        tracing::warn!(code = e.code(), "rejecting query: {e}");
        e
    })?;

    let results = state.executor.execute(&internal).await;
    match results.as_slice() {
        [statement] if statement.series.len() == 1 => {
            let series = translate_series(&statement.series[0], &internal);
            if series.is_empty() {
                tracing::warn!(
                    mapping = %internal.mapping,
                    "result table has no value columns, returning empty body"
                );
                return Ok(StatusCode::OK.into_response());
            }
            Ok(Json(series).into_response())
        }
        _ => {
            tracing::warn!(
                mapping = %internal.mapping,
                statements = results.len(),
                series = results.first().map_or(0, |r| r.series.len()),
                "unexpected result shape, returning empty body"
            );
            Ok(StatusCode::OK.into_response())
        }
    }
}
