//! Request-level errors rendered as JSON.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors produced by the middleware stack before a handler runs, or by the
/// built-in routes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("malformed JSON body: {0}")]
    MalformedJson(String),

    #[error("JSON body must be an object or an array")]
    NonStructuralJson,

    #[error("failed to read request body")]
    BodyRead,

    #[error("not found")]
    NotFound,

    #[error("{group} handlers are not available")]
    NotImplemented { group: &'static str },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::MalformedJson(_) | AppError::NonStructuralJson | AppError::BodyRead => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Plain 404 for unmatched requests.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
