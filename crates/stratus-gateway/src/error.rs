//! Gateway runtime error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use stratus_kernel::gateway::GatewayError;
use thiserror::Error;

/// Runtime errors raised while serving traffic or building documents.
#[derive(Debug, Error)]
pub enum GatewayImplError {
    #[error("configuration error: {0}")]
    Config(#[from] GatewayError),

    #[error("network error talking to cluster '{cluster_id}': {source}")]
    NetworkError {
        cluster_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cluster '{cluster_id}' answered {status}: {message}")]
    UpstreamError {
        cluster_id: String,
        status: u16,
        message: String,
    },

    #[error("route '{0}' has no cluster destination to forward to")]
    NoDestination(String),

    /// More than one upstream document declares the operation path a route
    /// targets.
    #[error("ambiguous operation path '{path}' declared by clusters [{}]", clusters.join(", "))]
    AmbiguousOperationPath { path: String, clusters: Vec<String> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayImplError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            GatewayImplError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
            GatewayImplError::NetworkError { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNREACHABLE"),
            GatewayImplError::UpstreamError { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            GatewayImplError::NoDestination(_) => (StatusCode::BAD_GATEWAY, "NO_DESTINATION"),
            GatewayImplError::AmbiguousOperationPath { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AMBIGUOUS_OPERATION_PATH",
            ),
            GatewayImplError::Io(_) | GatewayImplError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayImplError>;
