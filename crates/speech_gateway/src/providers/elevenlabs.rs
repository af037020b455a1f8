//! ElevenLabs text-to-speech
//!
//! Synthesis posts JSON to `/v1/text-to-speech/{voice_id}`. The voice
//! catalog is fetched live from `/v1/voices` on every listing request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::{ElevenLabsConfig, non_empty_secret};
use crate::error::SynthesisError;
use crate::ports::BackendAdapter;
use crate::providers::{ensure_success, http_client, truncate_chars};
use crate::types::{AudioFormat, EngineId, SynthesisResult, VoiceDescriptor, VoiceGender};

/// Adapter for the ElevenLabs API
#[derive(Debug, Clone)]
pub struct ElevenLabsAdapter {
    client: Client,
    config: ElevenLabsConfig,
}

/// Synthesis request body
#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

/// `/v1/voices` response
#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<RemoteVoice>,
}

#[derive(Debug, Deserialize)]
struct RemoteVoice {
    voice_id: String,
    name: String,
    #[serde(default)]
    labels: VoiceLabels,
}

#[derive(Debug, Default, Deserialize)]
struct VoiceLabels {
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

impl From<RemoteVoice> for VoiceDescriptor {
    fn from(voice: RemoteVoice) -> Self {
        let gender = voice
            .labels
            .gender
            .as_deref()
            .map_or(VoiceGender::Unspecified, VoiceGender::from_label);
        let descriptor = Self::new(voice.voice_id, voice.name).with_gender(gender);
        match voice.labels.language {
            Some(language) => descriptor.with_language(language),
            None => descriptor,
        }
    }
}

impl ElevenLabsAdapter {
    /// Create a new adapter
    ///
    /// # Errors
    ///
    /// Returns `SynthesisError::Configuration` if the configuration is invalid.
    pub fn new(config: ElevenLabsConfig) -> Result<Self, SynthesisError> {
        config.validate().map_err(SynthesisError::Configuration)?;
        let client = http_client(config.timeout_ms)?;
        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<&str, SynthesisError> {
        non_empty_secret(self.config.api_key.as_ref()).ok_or_else(|| {
            SynthesisError::MissingCredentials(
                "elevenlabs API key is not configured (speech.elevenlabs.api_key)".to_string(),
            )
        })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}

/// Voice ids are opaque alphanumeric tokens placed into the URL path
fn validate_voice_id(voice: &str) -> Result<(), SynthesisError> {
    if voice.is_empty() || !voice.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SynthesisError::InvalidRequest(format!(
            "invalid elevenlabs voice id '{voice}'"
        )));
    }
    Ok(())
}

#[async_trait]
impl BackendAdapter for ElevenLabsAdapter {
    fn engine(&self) -> EngineId {
        EngineId::ElevenLabs
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
        validate_voice_id(voice)?;
        let text = truncate_chars(text, self.config.max_text_chars);

        let request = TtsRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/text-to-speech/{voice}", self.base_url()))
            .header("xi-api-key", api_key)
            .header(reqwest::header::ACCEPT, AudioFormat::Mp3.mime_type())
            .json(&request)
            .send()
            .await?;

        let audio = ensure_success(EngineId::ElevenLabs, response)
            .await?
            .bytes()
            .await?;

        debug!(audio_size = audio.len(), "Speech synthesis complete");
        Ok(SynthesisResult::buffered(audio, AudioFormat::Mp3))
    }

    #[instrument(skip(self))]
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(format!("{}/v1/voices", self.base_url()))
            .header("xi-api-key", api_key)
            .timeout(Duration::from_millis(self.config.catalog_timeout_ms))
            .send()
            .await?;

        let catalog: VoicesResponse = ensure_success(EngineId::ElevenLabs, response)
            .await?
            .json()
            .await
            .map_err(|e| {
                SynthesisError::BackendUnavailable(format!("Invalid elevenlabs voice list: {e}"))
            })?;

        debug!(count = catalog.voices.len(), "Fetched elevenlabs voices");
        Ok(catalog.voices.into_iter().map(VoiceDescriptor::from).collect())
    }
}
