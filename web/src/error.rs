//! Error types for web handlers.
//!
//! This module bridges the runtime's error taxonomy to HTTP responses,
//! implementing Axum's `IntoResponse` trait: validation surfaces as 400,
//! missing entities (and an unconfigured system) as 404, rejected operator
//! moves as 409, and repository failures as 500 with the source logged but
//! not exposed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use liftsim_runtime::{DispatchError, LifecycleError};
use liftsim_core::RepositoryError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Data>, AppError> {
///     let lift = state.system.get_lift(id).await?;
///     Ok(Json(lift))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            message.into(),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            message.into(),
            "CONFLICT".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<DispatchError> for AppError {
    fn from(error: DispatchError) -> Self {
        match &error {
            DispatchError::FloorNotFound(_)
            | DispatchError::LiftNotFound(_)
            | DispatchError::SystemUnconfigured => Self::not_found(error.to_string()),
            DispatchError::InvalidDirection(_)
            | DispatchError::TargetOutOfRange { .. }
            | DispatchError::Domain(_) => Self::bad_request(error.to_string()),
            DispatchError::LiftNotAvailable(_) | DispatchError::FloorAtCapacity(_) => {
                Self::conflict(error.to_string())
            }
            DispatchError::Repository(_) => {
                Self::internal("dispatch failed").with_source(error.into())
            }
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(error: LifecycleError) -> Self {
        match &error {
            LifecycleError::Unconfigured
            | LifecycleError::LiftNotFound(_)
            | LifecycleError::FloorNotFound(_) => Self::not_found(error.to_string()),
            LifecycleError::Domain(_) => Self::bad_request(error.to_string()),
            LifecycleError::Repository(RepositoryError::Conflict(_)) => {
                Self::conflict(error.to_string())
            }
            LifecycleError::Repository(_) => {
                Self::internal("operation failed").with_source(error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftsim_core::{DomainError, LiftId};

    #[test]
    fn error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn dispatch_errors_map_to_statuses() {
        let err: AppError = DispatchError::FloorNotFound(9).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: AppError = DispatchError::SystemUnconfigured.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: AppError = DispatchError::Domain(DomainError::AlreadyAtFloor(1)).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = DispatchError::TargetOutOfRange {
            floor: 12,
            total_floors: 5,
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = DispatchError::FloorAtCapacity(3).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: AppError = DispatchError::LiftNotAvailable(LiftId::new()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn lifecycle_errors_map_to_statuses() {
        let err: AppError = LifecycleError::Unconfigured.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: AppError = LifecycleError::Domain(DomainError::TooFewFloors(1)).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError =
            LifecycleError::Repository(RepositoryError::Conflict("dup".into())).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
