//! Synthesis errors
//!
//! Every adapter failure leaves the gateway as exactly one [`SynthesisError`]
//! variant. [`SynthesisError::kind`] collapses the variants onto the coarse
//! [`ErrorKind`] callers use to pick a response status and retry policy.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while synthesizing speech or listing voices
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    /// The request itself is malformed (empty text, bad voice id)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The requested engine is not registered or not enabled
    #[error("Unsupported engine: {0}")]
    UnsupportedEngine(String),

    /// The engine needs credentials that are not configured
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The backend could not be reached or answered with a provider-side error
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend ran but produced no usable audio
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Local synthesis capacity is exhausted
    #[error("Overloaded: {0}")]
    Overloaded(String),

    /// Invalid engine configuration, raised while building adapters
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification of a [`SynthesisError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller's fault, never retried
    InvalidRequest,
    /// Configuration gap (absent key or invalid settings), surfaced to the operator
    MissingCredentials,
    /// Transient provider-side failure
    BackendUnavailable,
    /// Backend could not produce audio for the input
    SynthesisFailed,
    /// Local resource pool exhausted, caller should back off
    Overloaded,
}

impl ErrorKind {
    /// Stable snake_case code for this kind
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::MissingCredentials => "missing_credentials",
            Self::BackendUnavailable => "backend_unavailable",
            Self::SynthesisFailed => "synthesis_failed",
            Self::Overloaded => "overloaded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl SynthesisError {
    /// Get the coarse kind of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) | Self::UnsupportedEngine(_) => ErrorKind::InvalidRequest,
            Self::MissingCredentials(_) | Self::Configuration(_) => ErrorKind::MissingCredentials,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::SynthesisFailed(_) => ErrorKind::SynthesisFailed,
            Self::Overloaded(_) => ErrorKind::Overloaded,
        }
    }

    /// Whether a caller may retry the same request later
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::Overloaded(_))
    }
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::BackendUnavailable(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::BackendUnavailable(format!("connection failed: {err}"))
        } else {
            Self::BackendUnavailable(err.to_string())
        }
    }
}
