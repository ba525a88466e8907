/// Unified error types for the inventory service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use validator::ValidationErrors;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Malformed request that is not tied to a single field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level validation failures
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationErrors),

    /// Reset uid could not be decoded or names no user
    #[error("Invalid token.")]
    InvalidToken,

    /// Reset token failed the signature or expiry check
    #[error("Token expired or invalid.")]
    ExpiredOrInvalidToken,

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate username)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Outbound email errors
    #[error("Mail error: {0}")]
    Mail(String),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(String),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A failure that has already been written to the error log.
    /// Carries the message shown to the caller.
    #[error("{0}")]
    ServerFault(String),
}

/// JSON error body, shaped like every other response detail
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Server-side failure attached to a 500 response that still needs to be
/// recorded in the error log.
#[derive(Debug, Clone)]
pub struct UnloggedFailure {
    pub message: String,
    pub trace: String,
}

impl InventoryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            InventoryError::Authentication(_) => StatusCode::UNAUTHORIZED,
            InventoryError::Validation(_)
            | InventoryError::InvalidInput(_)
            | InventoryError::InvalidToken
            | InventoryError::ExpiredOrInvalidToken => StatusCode::BAD_REQUEST,
            InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
            InventoryError::Conflict(_) => StatusCode::CONFLICT,
            InventoryError::Database(_)
            | InventoryError::Migration(_)
            | InventoryError::Mail(_)
            | InventoryError::Jwt(_)
            | InventoryError::PasswordHash(_)
            | InventoryError::Internal(_)
            | InventoryError::Io(_)
            | InventoryError::ServerFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller. Never includes the text of an
    /// underlying store, transport or library error.
    fn detail(&self) -> String {
        match self {
            InventoryError::Authentication(msg)
            | InventoryError::Validation(msg)
            | InventoryError::NotFound(msg)
            | InventoryError::Conflict(msg)
            | InventoryError::ServerFault(msg) => msg.clone(),
            InventoryError::InvalidInput(_) => "Invalid input.".to_string(),
            InventoryError::InvalidToken | InventoryError::ExpiredOrInvalidToken => {
                self.to_string()
            }
            _ => "Internal server error.".to_string(),
        }
    }

    fn field_errors(&self) -> Option<BTreeMap<String, Vec<String>>> {
        let InventoryError::InvalidInput(errors) = self else {
            return None;
        };

        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        Some(fields)
    }
}

/// Render an error and its source chain for the error log
pub fn error_trace(err: &(dyn std::error::Error + 'static)) -> String {
    let mut trace = format!("{:?}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        trace.push_str(&format!("\nCaused by: {}", cause));
        source = cause.source();
    }
    trace
}

/// Convert InventoryError to HTTP response
impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            detail: self.detail(),
            errors: self.field_errors(),
        };

        let failure = (status == StatusCode::INTERNAL_SERVER_ERROR
            && !matches!(self, InventoryError::ServerFault(_)))
        .then(|| UnloggedFailure {
            message: self.to_string(),
            trace: error_trace(&self),
        });

        let mut response = (status, Json(body)).into_response();
        if let Some(failure) = failure {
            response.extensions_mut().insert(failure);
        }
        response
    }
}

/// Result type alias for service operations
pub type InventoryResult<T> = Result<T, InventoryError>;
