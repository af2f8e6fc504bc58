//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its
//! mapping onto HTTP statuses and JSON error bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use placement_core::ports::PortError;
use placement_core::roles::RoleError;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
///
/// Every handler failure converges here; `IntoResponse` renders the
/// taxonomy as `{"error": ...}` JSON with the matching status. Internals
/// are logged, never leaked.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input, with field-level detail.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Missing, invalid, or expired session. The message is always
    /// generic so nothing about the failure cause leaks.
    #[error("Invalid credentials")]
    Unauthenticated,

    /// An OAuth identity whose email domain is not the institution's.
    #[error("Unauthorized - not part of the institution")]
    OutsideInstitution,

    /// A valid session with the wrong role or ownership scope.
    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// Identity-provider or email-provider failure. Terminal for the
    /// request; no retries.
    #[error("Upstream service failure")]
    Upstream(String),

    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(field: &str, message: &str) -> Self {
        ApiError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthenticated | ApiError::OutsideInstitution => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_)
            | ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => ApiError::NotFound(what),
            PortError::Conflict(what) => ApiError::Conflict(what),
            PortError::Unauthorized => ApiError::Unauthenticated,
            PortError::Unexpected(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<RoleError> for ApiError {
    fn from(err: RoleError) -> Self {
        match err {
            RoleError::OutsideInstitution => ApiError::OutsideInstitution,
            RoleError::RoleMismatch { .. } => ApiError::Forbidden,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {:?}", self);
        }
        let body = match &self {
            ApiError::Validation { field, message } => json!({
                "error": message,
                "field": field,
            }),
            // 5xx details stay in the log.
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => json!({
                "error": "Internal server error",
            }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
