use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("config error: {0}")]
    Config(String),

    #[error("malformed request body: {0}")]
    MalformedRequestBody(String),

    #[error("request contains no queries")]
    EmptyQuery,

    #[error("invalid timestamp {0}: must be a non-negative integer of at most 19 digits")]
    InvalidTimestamp(String),

    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("metrics resolve to different mappings: {first} and {second}")]
    MixedMappings { first: String, second: String },

    #[error("no alive backend for mapping {0}")]
    NoBackendAvailable(String),

    #[error("backend connection error ({url}): {message}")]
    BackendConnection { url: String, message: String },

    #[error("backend query error ({url}): {message}")]
    BackendQuery { url: String, message: String },
}

impl GatewayError {
    /// Stable machine-readable code included in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Config(_) => "config",
            GatewayError::MalformedRequestBody(_) => "malformed_request_body",
            GatewayError::EmptyQuery => "empty_query",
            GatewayError::InvalidTimestamp(_) => "invalid_timestamp",
            GatewayError::UnknownMetric(_) => "unknown_metric",
            GatewayError::MixedMappings { .. } => "mixed_mappings",
            GatewayError::NoBackendAvailable(_) => "no_backend_available",
            GatewayError::BackendConnection { .. } => "backend_connection",
            GatewayError::BackendQuery { .. } => "backend_query",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            GatewayError::MalformedRequestBody(_)
            | GatewayError::EmptyQuery
            | GatewayError::InvalidTimestamp(_)
            | GatewayError::UnknownMetric(_)
            | GatewayError::MixedMappings { .. } => StatusCode::BAD_REQUEST,
            GatewayError::NoBackendAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::BackendConnection { .. } | GatewayError::BackendQuery { .. } => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
