//! Error types for the PropertyData server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::classifier::PipelineError;
use crate::scraper::ScraperError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

const INTERNAL_ERROR: &str = "An internal error occurred";

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Scraper(ScraperError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Pipeline(PipelineError::Ocr { source, .. }) => source.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
            ErrorResponse {
                error: INTERNAL_ERROR.to_string(),
                details: Some(self.to_string()),
            }
        } else {
            if status == StatusCode::SERVICE_UNAVAILABLE {
                tracing::warn!("Dependency unavailable: {}", self);
            }
            ErrorResponse {
                error: self.to_string(),
                details: None,
            }
        };

        (status, Json(body)).into_response()
    }
}
