//! OpenAI speech provider
//!
//! Implements `BackendAdapter` using the OpenAI `/audio/speech` endpoint.
//!
//! # Output
//!
//! Always requested as MP3; the voice list is static because the API has no
//! voices endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::{OpenAIConfig, non_empty_secret};
use crate::error::SynthesisError;
use crate::ports::BackendAdapter;
use crate::providers::{http_client, truncate_chars};
use crate::types::{AudioFormat, EngineId, SynthesisResult, VoiceDescriptor, VoiceGender};

/// Built-in voices, as `(id, gender)`
const VOICES: &[(&str, VoiceGender)] = &[
    ("alloy", VoiceGender::Neutral),
    ("echo", VoiceGender::Male),
    ("fable", VoiceGender::Male),
    ("onyx", VoiceGender::Male),
    ("nova", VoiceGender::Female),
    ("shimmer", VoiceGender::Female),
];

/// OpenAI speech adapter
#[derive(Debug, Clone)]
pub struct OpenAISpeechAdapter {
    client: Client,
    config: OpenAIConfig,
}

/// OpenAI TTS request body
#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    speed: f32,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    code: Option<String>,
}

impl OpenAISpeechAdapter {
    /// Create a new OpenAI speech adapter
    ///
    /// # Errors
    ///
    /// Returns `SynthesisError::Configuration` if the configuration is invalid.
    pub fn new(config: OpenAIConfig) -> Result<Self, SynthesisError> {
        config.validate().map_err(SynthesisError::Configuration)?;
        let client = http_client(config.timeout_ms)?;
        Ok(Self { client, config })
    }

    /// Get the API key
    fn api_key(&self) -> Result<&str, SynthesisError> {
        non_empty_secret(self.config.api_key.as_ref()).ok_or_else(|| {
            SynthesisError::MissingCredentials(
                "openai API key is not configured (speech.openai.api_key)".to_string(),
            )
        })
    }

    /// Build the TTS endpoint URL
    fn tts_url(&self) -> String {
        format!("{}/audio/speech", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl BackendAdapter for OpenAISpeechAdapter {
    fn engine(&self) -> EngineId {
        EngineId::OpenAI
    }

    fn default_voice(&self) -> &str {
        &self.config.default_voice
    }

    fn max_text_chars(&self) -> usize {
        self.config.max_text_chars
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesisResult, SynthesisError> {
        let api_key = self.api_key()?;
        let text = truncate_chars(text, self.config.max_text_chars);

        debug!(voice = %voice, model = %self.config.model, "Synthesizing speech");

        let request = TtsRequest {
            model: &self.config.model,
            input: text,
            voice,
            response_format: AudioFormat::Mp3.extension(),
            speed: self.config.speed,
        };

        let response = self
            .client
            .post(self.tts_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();

            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_body) {
                let code = api_error.error.code.as_deref().unwrap_or("unknown");
                return Err(SynthesisError::BackendUnavailable(format!(
                    "openai returned HTTP {status} ({code}): {}",
                    api_error.error.message
                )));
            }

            return Err(SynthesisError::BackendUnavailable(format!(
                "openai returned HTTP {status}: {}",
                truncate_chars(error_body.trim(), 200)
            )));
        }

        let audio = response.bytes().await?;

        debug!(audio_size = audio.len(), "Speech synthesis complete");
        Ok(SynthesisResult::buffered(audio, AudioFormat::Mp3))
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
        // OpenAI doesn't have a voices endpoint, return static list
        Ok(VOICES
            .iter()
            .map(|&(id, gender)| {
                let mut name = id.to_string();
                if let Some(first) = name.get_mut(..1) {
                    first.make_ascii_uppercase();
                }
                VoiceDescriptor::new(id, name).with_gender(gender)
            })
            .collect())
    }
}
