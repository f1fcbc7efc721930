use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Per-field validation messages (validation failures only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Field-level validation failures collected while checking a request.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Turns the collected messages into `Err` if any were recorded.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let first = self.fields.values().flatten().next();
        match first {
            Some(message) if self.fields.values().flatten().count() > 1 => {
                write!(f, "{} (and more errors)", message)
            }
            Some(message) => write!(f, "{}", message),
            None => write!(f, "invalid request"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: msg,
                    errors: None,
                },
            ),
            AppError::Validation(errors) => {
                tracing::debug!("Rejected request: {}", errors);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse {
                        error: errors.to_string(),
                        errors: Some(errors.fields),
                    },
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_empty_is_ok() {
        assert!(ValidationErrors::default().into_result().is_ok());
    }

    #[test]
    fn test_validation_errors_display_single() {
        let mut errors = ValidationErrors::default();
        errors.add("country", "The country must be 2 characters.");
        assert_eq!(errors.to_string(), "The country must be 2 characters.");
    }

    #[test]
    fn test_validation_errors_display_multiple() {
        let mut errors = ValidationErrors::default();
        errors.add("country", "The country must be 2 characters.");
        errors.add("page", "The page must be at least 1.");
        assert_eq!(
            errors.to_string(),
            "The country must be 2 characters. (and more errors)"
        );
    }

    #[test]
    fn test_validation_status_code() {
        let mut errors = ValidationErrors::default();
        errors.add("per_page", "The per page must be between 10 and 100.");
        let response = AppError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_bad_request_status_code() {
        let response = AppError::BadRequest("bad query string".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
