//! Backend adapter implementations
//!
//! One adapter per engine:
//! - `piper` - local process engine with optional transcoding
//! - `google`, `microsoft`, `elevenlabs`, `openai` - cloud HTTP APIs
//! - `opentts` - self-hosted server relayed as a stream

pub mod elevenlabs;
pub mod google;
pub mod microsoft;
pub mod openai;
pub mod opentts;
pub mod piper;

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, warn};

use crate::error::SynthesisError;
use crate::types::EngineId;

pub use elevenlabs::ElevenLabsAdapter;
pub use google::GoogleTranslateAdapter;
pub use microsoft::MicrosoftSpeechAdapter;
pub use openai::OpenAISpeechAdapter;
pub use opentts::OpenTtsAdapter;
pub use piper::PiperAdapter;

/// Longest error body echoed into an error message
const MAX_ERROR_BODY: usize = 200;

/// Cut `text` to at most `max_chars` characters on a char boundary
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            debug!(max_chars, original_len = text.chars().count(), "Truncating text");
            &text[..idx]
        },
        None => text,
    }
}

/// Build an HTTP client with a mandatory total timeout
pub(crate) fn http_client(timeout_ms: u64) -> Result<Client, SynthesisError> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| SynthesisError::BackendUnavailable(format!("Failed to create HTTP client: {e}")))
}

/// Map a non-2xx provider response to `BackendUnavailable`
pub(crate) async fn ensure_success(
    engine: EngineId,
    response: Response,
) -> Result<Response, SynthesisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body = truncate_chars(body.trim(), MAX_ERROR_BODY);
    warn!(%engine, %status, "Provider returned error status");

    Err(SynthesisError::BackendUnavailable(if body.is_empty() {
        format!("{engine} returned HTTP {status}")
    } else {
        format!("{engine} returned HTTP {status}: {body}")
    }))
}
