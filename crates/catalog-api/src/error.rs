//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Failures that abort a request outright.
///
/// Form validation problems are not errors at this level; handlers answer
/// those with a re-rendered form and status 422.
#[derive(Debug)]
pub enum ApiError {
    Database(catalog_core::Error),
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<catalog_core::Error> for ApiError {
    fn from(err: catalog_core::Error) -> Self {
        use catalog_core::Error;
        match err {
            Error::NotFound(what) => ApiError::NotFound(what),
            Error::ProductNotFound(id) => ApiError::NotFound(format!("Product {} not found", id)),
            Error::ImageNotFound(id) => ApiError::NotFound(format!("Image {} not found", id)),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Validation(e) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Database(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(e) => {
                error!(subsystem = "api", error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                error!(subsystem = "api", error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
