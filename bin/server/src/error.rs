//! Error types for the HTTP surface.
//!
//! - `ApiError`: a request failed; rendered as `{"error": ...}` with a status
//! - `StartupError`: the server could not start, returned from `main` inside
//!   a rootcause `Report`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parley_nodes::NodeError;
use serde_json::json;
use std::fmt;

/// Request-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request body or its contents were rejected.
    BadRequest { message: String },
    /// The addressed resource does not exist.
    NotFound { message: String },
    /// Something failed on our side.
    Internal { message: String },
}

impl ApiError {
    /// Returns the response status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest { message }
            | Self::NotFound { message }
            | Self::Internal { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<NodeError> for ApiError {
    fn from(e: NodeError) -> Self {
        let message = e.to_string();
        match e {
            NodeError::UnknownNode { .. } => Self::NotFound { message },
            NodeError::InvalidInput { .. } => Self::BadRequest { message },
            NodeError::ExecutionFailed { .. } => Self::Internal { message },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Errors that stop the server from starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Config,
    /// The provider HTTP client could not be built.
    HttpClient,
    /// The listener could not be bound.
    Bind { address: String },
    /// The server stopped with an I/O error.
    Serve,
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "failed to load configuration"),
            Self::HttpClient => write!(f, "failed to build provider HTTP client"),
            Self::Bind { address } => write!(f, "failed to bind to {address}"),
            Self::Serve => write!(f, "server error"),
        }
    }
}

impl std::error::Error for StartupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_errors_map_to_statuses() {
        let unknown = ApiError::from(NodeError::UnknownNode {
            class_name: "X".to_string(),
        });
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(NodeError::InvalidInput {
            message: "bad".to_string(),
        });
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.to_string(), "invalid input: bad");

        let failed = ApiError::from(NodeError::ExecutionFailed {
            message: "boom".to_string(),
        });
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn startup_error_display() {
        let err = StartupError::Bind {
            address: "127.0.0.1:8188".to_string(),
        };
        assert!(err.to_string().contains("127.0.0.1:8188"));
    }
}
