//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use agro_shop_core::ports::PortError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Port(port) => match port {
                PortError::NotFound(_) => StatusCode::NOT_FOUND,
                PortError::Conflict(_) | PortError::Validation(_) => StatusCode::BAD_REQUEST,
                PortError::Forbidden(_) => StatusCode::FORBIDDEN,
                PortError::Unauthorized => StatusCode::UNAUTHORIZED,
                PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Config(_)
            | Self::Database(_)
            | Self::Migrate(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "An internal server error occurred".to_string()
        } else {
            match &self {
                Self::Port(port) => port.to_string(),
                other => other.to_string(),
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        if messages.is_empty() {
            return Self::BadRequest("Invalid request".to_string());
        }
        messages.sort();
        Self::BadRequest(messages.join("; "))
    }
}

/// A convenience type alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;

/// Swaps a port-level not-found for a fixed client-facing message, e.g.
/// `.map_err(not_found_as("Product not found"))`.
pub fn not_found_as(message: &'static str) -> impl Fn(PortError) -> ApiError {
    move |err| match err {
        PortError::NotFound(_) => ApiError::NotFound(message.to_string()),
        other => other.into(),
    }
}
