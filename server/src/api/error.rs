//! HTTP error mapping
//!
//! Every handler returns [`ApiResult`]; failures render as
//! `{"error": {"code": ..., "message": ...}}`.

use crate::error::AppError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    /// Missing or malformed caller identity (401)
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Format known but no formatter installed (501)
    #[error("{0}")]
    NotImplemented(String),

    /// Malformed or mistyped request body
    #[error("Invalid request body: {}", .0.body_text())]
    Body(#[from] JsonRejection),

    /// Malformed query string
    #[error("Invalid query: {}", .0.body_text())]
    Query(#[from] QueryRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Query(rejection) => rejection.status(),
            ApiError::App(err) => match err {
                AppError::NotFound { .. } | AppError::NoData(_) => StatusCode::NOT_FOUND,
                AppError::Conflict(_) => StatusCode::CONFLICT,
                AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
                AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AppError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AppError::Database(_)
                | AppError::Io(_)
                | AppError::Serialization(_)
                | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotImplemented(_) => "NOT_IMPLEMENTED",
            ApiError::Body(_) | ApiError::Query(_) => "INVALID_INPUT",
            ApiError::App(err) => err.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
