use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::errors::BedsideError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Request body was not valid JSON. The transport contract for this
    /// case is a bare client-error status with an empty body.
    #[error("malformed request body")]
    MalformedRequest,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MalformedRequest => StatusCode::BAD_REQUEST.into_response(),
            AppError::BadRequest(s) => {
                (StatusCode::BAD_REQUEST, Json(ErrBody { error: s })).into_response()
            }
            AppError::Internal(s) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrBody { error: s })).into_response()
            }
        }
    }
}

// Conversion from core errors. Anything that escapes a request handler is a
// server-side fault: the request payload itself is validated leniently, so a
// shape mismatch here means the service and its model disagree.
impl From<BedsideError> for AppError {
    fn from(err: BedsideError) -> Self {
        match err {
            BedsideError::Config { message } => AppError::Internal(message),
            BedsideError::ShapeMismatch { expected, actual } => {
                AppError::Internal(format!("shape mismatch: expected {expected}, got {actual}"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
