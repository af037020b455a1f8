//! Google Translate speech endpoint
//!
//! The unauthenticated `translate_tts` endpoint used by browser clients.
//! Voices are language codes and input is limited to short phrases.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::GoogleConfig;
use crate::error::SynthesisError;
use crate::ports::BackendAdapter;
use crate::providers::{ensure_success, http_client, truncate_chars};
use crate::types::{AudioFormat, EngineId, SynthesisResult, VoiceDescriptor};

/// Languages offered by the endpoint, as `(code, name)`
const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("en-GB", "English (UK)"),
    ("en-AU", "English (Australia)"),
    ("de", "German"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("it", "Italian"),
    ("nl", "Dutch"),
    ("pt", "Portuguese"),
    ("pl", "Polish"),
    ("sv", "Swedish"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh-CN", "Chinese (Mandarin)"),
];

/// Adapter for the Google Translate speech endpoint
#[derive(Debug, Clone)]
pub struct GoogleTranslateAdapter {
    client: Client,
    config: GoogleConfig,
}

impl GoogleTranslateAdapter {
    /// Create a new adapter
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the HTTP client cannot be built.
    pub fn new(config: GoogleConfig) -> Result<Self, SynthesisError> {
        let client = http_client(config.timeout_ms)?;
        Ok(Self { client, config })
    }

    fn tts_url(&self) -> String {
        format!("{}/translate_tts", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl BackendAdapter for GoogleTranslateAdapter {
    fn engine(&self) -> EngineId {
        EngineId::Google
    }

    fn default_voice(&self) -> &str {
        &self.config.default_voice
    }

    fn max_text_chars(&self) -> usize {
        self.config.max_text_chars
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesisResult, SynthesisError> {
        let text = truncate_chars(text, self.config.max_text_chars);

        let response = self
            .client
            .get(self.tts_url())
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", voice),
                ("q", text),
            ])
            .send()
            .await?;

        let audio = ensure_success(EngineId::Google, response).await?.bytes().await?;

        debug!(audio_size = audio.len(), "Speech synthesis complete");
        Ok(SynthesisResult::buffered(audio, AudioFormat::Mp3))
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
        Ok(LANGUAGES
            .iter()
            .map(|(code, name)| VoiceDescriptor::new(*code, *name).with_language(*code))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn adapter(server: &MockServer) -> GoogleTranslateAdapter {
        GoogleTranslateAdapter::new(GoogleConfig {
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn synthesize_sends_language_and_text() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/translate_tts"))
            .and(query_param("ie", "UTF-8"))
            .and(query_param("client", "tw-ob"))
            .and(query_param("tl", "de"))
            .and(query_param("q", "Bitte lächeln!"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3audio".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let result = adapter(&server)
            .synthesize("Bitte lächeln!", "de")
            .await
            .unwrap();

        assert_eq!(result.mime_type(), "audio/mpeg");
        assert_eq!(result.suggested_filename(), "speech.mp3");
        assert_eq!(result.into_bytes().await.unwrap().as_ref(), b"ID3audio");
    }

    #[tokio::test]
    async fn long_text_is_truncated_to_limit() {
        let server = MockServer::start().await;
        let long_text = "a".repeat(250);

        Mock::given(method("GET"))
            .and(path("/translate_tts"))
            .and(query_param("q", "a".repeat(200)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        assert!(adapter(&server).synthesize(&long_text, "en").await.is_ok());
    }

    #[tokio::test]
    async fn error_status_is_backend_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/translate_tts"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .expect(1)
            .mount(&server)
            .await;

        let result = adapter(&server).synthesize("Hello", "en").await;

        assert!(matches!(
            result,
            Err(SynthesisError::BackendUnavailable(ref m)) if m.contains("429") && m.contains("Too Many Requests")
        ));
    }

    #[tokio::test]
    async fn lists_static_languages() {
        let server = MockServer::start().await;
        let voices = adapter(&server).list_voices().await.unwrap();

        assert!(voices.iter().any(|v| v.id == "en"));
        assert!(voices.iter().all(|v| v.language.as_deref() == Some(v.id.as_str())));
    }

    #[test]
    fn defaults() {
        let adapter = GoogleTranslateAdapter::new(GoogleConfig::default()).unwrap();
        assert_eq!(adapter.engine(), EngineId::Google);
        assert_eq!(adapter.default_voice(), "en");
        assert_eq!(adapter.max_text_chars(), 200);
        assert_eq!(adapter.tts_url(), "https://translate.google.com/translate_tts");
    }
}
