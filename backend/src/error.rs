//! Error handling for the Crop Health Advisory service
//!
//! Only input problems and an unavailable model surface to callers; the
//! advisory pipeline itself absorbs inference, oracle and persistence
//! failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use shared::RequestError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidRequest(RequestError::MissingField(_)) => {
                (StatusCode::BAD_REQUEST, "MISSING_FIELD")
            }
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            AppError::ModelUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let field = match &self {
            AppError::InvalidRequest(e) => e.field().map(str::to_string),
            _ => None,
        };

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Rejected request: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code,
            field,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
