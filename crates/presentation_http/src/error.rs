//! API error handling
//!
//! Maps classified synthesis errors onto HTTP statuses with a JSON body.
//! Backend-side messages can be hidden from callers in production.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use speech_gateway::{ErrorKind, SynthesisError};
use thiserror::Error;

/// Global flag to control error detail exposure
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(true);

/// Configure whether backend error details are included in responses.
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::SeqCst);
}

fn should_expose_details() -> bool {
    EXPOSE_INTERNAL_ERRORS.load(Ordering::SeqCst)
}

const GENERIC_MESSAGE: &str = "An error occurred processing your request";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] JsonRejection),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Whether the same request may succeed later
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

/// HTTP status for an error kind
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::MissingCredentials | ErrorKind::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::BackendUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::SynthesisFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, retryable) = match &self {
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorKind::InvalidRequest.code(),
                msg.clone(),
                false,
            ),
            Self::InvalidJson(rejection) => (
                StatusCode::BAD_REQUEST,
                ErrorKind::InvalidRequest.code(),
                rejection.body_text(),
                false,
            ),
            Self::Synthesis(err) => {
                let kind = err.kind();
                // Caller and operator errors are always safe to show
                let message = match kind {
                    ErrorKind::BackendUnavailable | ErrorKind::SynthesisFailed
                        if !should_expose_details() =>
                    {
                        GENERIC_MESSAGE.to_string()
                    },
                    _ => err.to_string(),
                };
                (status_for(kind), kind.code(), message, err.is_retryable())
            },
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            retryable,
        };

        (status, Json(body)).into_response()
    }
}
