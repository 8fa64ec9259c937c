//! Error types for jukevote-server
//!
//! Every failure leaves the handler as a flat `{"error": message}` body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jukevote_common::Error as StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body could not be used (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Path does not name a song (404)
    #[error("Song not found")]
    SongNotFound,

    /// Song exists but carries no picture (404)
    #[error("Picture not found")]
    NoPicture,

    /// Body rejected by the JSON extractor; keeps the extractor's status
    #[error("{0}")]
    Json(#[from] JsonRejection),

    /// Store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SongNotFound | ApiError::NoPicture => StatusCode::NOT_FOUND,
            ApiError::Json(JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Json(rejection) => rejection.status(),
            ApiError::Store(err) => match err {
                StoreError::ValidationFailed(_) | StoreError::NoFieldsProvided => {
                    StatusCode::BAD_REQUEST
                }
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Database(_) | StoreError::Io(_) | StoreError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Json(rejection) => rejection.body_text(),
            ApiError::Store(StoreError::NotFound(_)) => "Song not found".to_string(),
            // Server-side detail stays in the log
            ApiError::Store(StoreError::StorageUnavailable(_)) => "Storage unavailable".to_string(),
            _ if self.status().is_server_error() => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!(%status, "Request rejected: {}", message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
