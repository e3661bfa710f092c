// src/error.rs

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request, with optional per-field detail
    Validation {
        message: String,
        fields: BTreeMap<String, String>,
    },

    // 400 Bad Request: the request is well formed but breaks a business rule
    // (double delete, already published, duplicate username, ...)
    Conflict(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // The sentiment analyzer failed or answered success=false.
    Upstream(String),
}

impl AppError {
    /// `"Post with id '42' not found"`
    pub fn not_found(entity: &str, id: impl fmt::Display) -> Self {
        AppError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// `"User with username 'bob' not found"`
    pub fn not_found_by(entity: &str, field: &str, value: impl fmt::Display) -> Self {
        AppError::NotFound(format!("{} with {} '{}' not found", entity, field, value))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.clone());
        AppError::Validation { message, fields }
    }

    /// Stable machine-readable code used in the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InternalServerError(_) => "INTERNAL_ERROR",
            AppError::Validation { .. } => "VALIDATION_FAILED",
            AppError::Conflict(_) => "BUSINESS_ERROR",
            AppError::AuthError(_) => "AUTHENTICATION_FAILED",
            AppError::Forbidden(_) => "ACCESS_DENIED",
            AppError::NotFound(_) => "RESOURCE_NOT_FOUND",
            AppError::Upstream(_) => "UPSTREAM_FAILURE",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg)
            | AppError::Conflict(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Upstream(msg) => write!(f, "{}", msg),
            AppError::Validation { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message, fields) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::Validation { message, fields } => {
                let fields = if fields.is_empty() { None } else { Some(fields) };
                (StatusCode::BAD_REQUEST, message, fields)
            }
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg, None)
            }
        };

        let body = match fields {
            Some(fields) => json!({ "code": code, "error": error_message, "fieldErrors": fields }),
            None => json!({ "code": code, "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::invalid(err.to_string())
    }
}

/// Flattens `validator` output into `field -> first message`.
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        for (field, errs) in errors.field_errors() {
            if let Some(first) = errs.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| first.code.to_string());
                fields.insert(field.to_string(), message);
            }
        }
        AppError::Validation {
            message: "Request validation failed".to_string(),
            fields,
        }
    }
}

/// True when the database rejected a write because of a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
