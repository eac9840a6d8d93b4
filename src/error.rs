use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::store::StoreError;

/// Errors surfaced by the HTTP API.
///
/// `Internal` carries the underlying cause for logging only; the wire body is
/// always the generic message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("not found")]
    NotFound,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("bot verification failed")]
    VerificationFailed,
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::DuplicateEmail,
            StoreError::Backend(msg) => ApiError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorBody {
    pub fn new(error: &str, message: &str, code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            code,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("bad_request", msg, 400),
            ),
            ApiError::Unauthorized(reason) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("unauthorized", reason, 401)
                    .with_hint("Contact the administrator to obtain an access token"),
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("not_found", "not found", 404),
            ),
            ApiError::DuplicateEmail => (
                StatusCode::CONFLICT,
                ErrorBody::new("conflict", "email already registered", 409),
            ),
            ApiError::VerificationFailed => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("verification_failed", "bot verification failed", 400),
            ),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("internal_error", "internal server error", 500),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
