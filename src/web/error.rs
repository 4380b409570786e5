//! Error responses for the HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ontology::QueryError;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Unknown database or table.
    NotFound(String),
    /// Malformed request parameters.
    BadRequest(String),
}

/// Error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
        };

        let body = ErrorResponse {
            error: true,
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidDepth(_) => ApiError::BadRequest(err.to_string()),
            QueryError::DatabaseNotFound(_)
            | QueryError::TableNotFound(_)
            | QueryError::NoPathFound { .. } => ApiError::NotFound(err.to_string()),
        }
    }
}
