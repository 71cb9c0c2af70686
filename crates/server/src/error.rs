//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::platform::{IdentityError, StoreError};

/// Application-level error type for the recipe service.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required field was empty or malformed after normalization.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request carries no usable identity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A mutation was attempted by someone other than the record's owner.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The targeted record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Identity service operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Document platform operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] StoreError),
}

impl AppError {
    /// Whether this error is a server-side failure worth capturing.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Backend(_) => true,
            Self::Identity(err) => matches!(
                err,
                IdentityError::Http(_)
                    | IdentityError::Parse(_)
                    | IdentityError::Service { .. }
                    | IdentityError::Malformed(_)
            ),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Identity(err) => match err {
                IdentityError::InvalidCredentials | IdentityError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                IdentityError::EmailTaken => StatusCode::CONFLICT,
                IdentityError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Backend(_) => "External service error".to_string(),
            Self::Identity(err) => match err {
                IdentityError::InvalidCredentials => "Invalid credentials".to_string(),
                IdentityError::InvalidToken => "Invalid or expired token".to_string(),
                IdentityError::EmailTaken => {
                    "An account with this email already exists".to_string()
                }
                IdentityError::WeakPassword(msg) => msg.clone(),
                _ => "Authentication service error".to_string(),
            },
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
