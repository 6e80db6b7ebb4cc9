//! Error type for HTTP handlers and its response mapping.

use std::error::Error as _;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::validation::{ValidationError, ValidationErrors};
use crate::service::ServiceError;

const GENERIC_MESSAGE: &str = "An error occurred while processing your request";

/// Error type for HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body failed validation. Carries every violation.
    #[error("validation failed with {} violation(s)", .0.len())]
    Validation(Vec<ValidationError>),
    /// Body could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("too many requests")]
    TooManyRequests,
    /// Unexpected failure. `verbose` exposes the message and cause chain.
    #[error("internal error: {source}")]
    Internal {
        #[source]
        source: ServiceError,
        verbose: bool,
    },
}

impl ApiError {
    /// Map this error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now(),
            stack_trace: None,
            details: None,
        }
    }

    /// 500 body with the generic message.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE)
    }

    fn internal_verbose(err: &ServiceError) -> Self {
        let mut chain = Vec::new();
        let mut cause = err.source();
        while let Some(e) = cause {
            chain.push(e.to_string());
            cause = e.source();
        }

        Self {
            stack_trace: Some(chain.join("\n")),
            details: Some(format!("{err:?}")),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::Validation(errors) => (status, Json(ValidationErrors { errors })).into_response(),
            ApiError::NotFound | ApiError::Unauthorized => status.into_response(),
            ApiError::BadRequest(message) => ErrorResponse::new(status, message).into_response(),
            ApiError::TooManyRequests => {
                ErrorResponse::new(status, "Too many requests").into_response()
            }
            ApiError::Internal { source, verbose } => {
                tracing::error!(error = %source, "request failed");
                if verbose {
                    ErrorResponse::internal_verbose(&source).into_response()
                } else {
                    ErrorResponse::internal().into_response()
                }
            }
        }
    }
}
