//! Microsoft Azure neural speech
//!
//! Posts an SSML document to the regional `cognitiveservices/v1` endpoint.
//! The output format header decides the audio container.

use async_trait::async_trait;
use quick_xml::escape::escape;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::{MicrosoftConfig, non_empty_secret};
use crate::error::SynthesisError;
use crate::ports::BackendAdapter;
use crate::providers::{ensure_success, http_client, truncate_chars};
use crate::types::{AudioFormat, EngineId, SynthesisResult, VoiceDescriptor, VoiceGender};

/// Neural voices offered without a catalog call, as `(id, gender)`
const VOICES: &[(&str, VoiceGender)] = &[
    ("en-US-JennyNeural", VoiceGender::Female),
    ("en-US-AriaNeural", VoiceGender::Female),
    ("en-US-GuyNeural", VoiceGender::Male),
    ("en-US-DavisNeural", VoiceGender::Male),
    ("en-GB-SoniaNeural", VoiceGender::Female),
    ("en-GB-RyanNeural", VoiceGender::Male),
    ("de-DE-KatjaNeural", VoiceGender::Female),
    ("de-DE-ConradNeural", VoiceGender::Male),
    ("fr-FR-DeniseNeural", VoiceGender::Female),
    ("es-ES-ElviraNeural", VoiceGender::Female),
];

/// Adapter for Azure neural text-to-speech
#[derive(Debug, Clone)]
pub struct MicrosoftSpeechAdapter {
    client: Client,
    config: MicrosoftConfig,
    format: AudioFormat,
}

impl MicrosoftSpeechAdapter {
    /// Create a new adapter
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the output format has no playable container,
    /// or `BackendUnavailable` if the HTTP client cannot be built.
    pub fn new(config: MicrosoftConfig) -> Result<Self, SynthesisError> {
        config.validate().map_err(SynthesisError::Configuration)?;
        let format = config.audio_format().ok_or_else(|| {
            SynthesisError::Configuration(format!(
                "microsoft: unsupported output_format '{}'",
                config.output_format
            ))
        })?;
        let client = http_client(config.timeout_ms)?;
        Ok(Self {
            client,
            config,
            format,
        })
    }

    fn api_key(&self) -> Result<&str, SynthesisError> {
        non_empty_secret(self.config.api_key.as_ref()).ok_or_else(|| {
            SynthesisError::MissingCredentials(
                "microsoft subscription key is not configured (speech.microsoft.api_key)"
                    .to_string(),
            )
        })
    }

    fn tts_url(&self) -> String {
        format!(
            "{}/cognitiveservices/v1",
            self.config.endpoint().trim_end_matches('/')
        )
    }

}

/// Locale prefix of a voice name, `en-US-JennyNeural` gives `en-US`
fn voice_locale(voice: &str) -> &str {
    let mut dashes = voice.match_indices('-').map(|(i, _)| i);
    match (dashes.next(), dashes.next()) {
        (Some(_), Some(end)) => &voice[..end],
        _ => "en-US",
    }
}

fn build_ssml(text: &str, voice: &str) -> String {
    let locale = escape(voice_locale(voice));
    format!(
        "<speak version='1.0' xml:lang='{locale}'><voice xml:lang='{locale}' name='{}'>{}</voice></speak>",
        escape(voice),
        escape(text)
    )
}

#[async_trait]
impl BackendAdapter for MicrosoftSpeechAdapter {
    fn engine(&self) -> EngineId {
        EngineId::Microsoft
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

        let response = self
            .client
            .post(self.tts_url())
            .header("Ocp-Apim-Subscription-Key", api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.config.output_format)
            .header(reqwest::header::USER_AGENT, "speechgate")
            .body(build_ssml(text, voice))
            .send()
            .await?;

        let audio = ensure_success(EngineId::Microsoft, response)
            .await?
            .bytes()
            .await?;

        debug!(audio_size = audio.len(), "Speech synthesis complete");
        Ok(SynthesisResult::buffered(audio, self.format))
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
        Ok(VOICES
            .iter()
            .map(|&(id, gender)| {
                let name = id
                    .rsplit('-')
                    .next()
                    .unwrap_or(id)
                    .trim_end_matches("Neural");
                VoiceDescriptor::new(id, name)
                    .with_gender(gender)
                    .with_language(voice_locale(id))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn adapter_with_key(server: &MockServer, key: Option<&str>) -> MicrosoftSpeechAdapter {
        MicrosoftSpeechAdapter::new(MicrosoftConfig {
            api_key: key.map(|k| SecretString::from(k.to_string())),
            base_url: Some(server.uri()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn ssml_escapes_markup_in_text_and_voice() {
        let ssml = build_ssml(r#"Tom & Jerry <say> "hi""#, "en-US-x'y");
        assert!(ssml.contains(">Tom &amp; Jerry &lt;say&gt; &quot;hi&quot;</voice>"));
        assert!(ssml.contains("name='en-US-x&apos;y'"));
    }

    #[test]
    fn locale_comes_from_voice_name() {
        assert_eq!(voice_locale("de-DE-KatjaNeural"), "de-DE");
        assert_eq!(voice_locale("odd"), "en-US");
    }

    #[test]
    fn ssml_wraps_escaped_text() {
        let ssml = build_ssml("Fish & chips", "en-GB-RyanNeural");
        assert_eq!(
            ssml,
            "<speak version='1.0' xml:lang='en-GB'><voice xml:lang='en-GB' name='en-GB-RyanNeural'>Fish &amp; chips</voice></speak>"
        );
    }

    #[test]
    fn endpoint_derives_from_region() {
        let adapter = MicrosoftSpeechAdapter::new(MicrosoftConfig {
            region: "westeurope".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            adapter.tts_url(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );
    }

    #[test]
    fn output_format_maps_to_container() {
        let mut config = MicrosoftConfig::default();
        assert_eq!(
            MicrosoftSpeechAdapter::new(config.clone()).unwrap().format,
            AudioFormat::Mp3
        );
        config.output_format = "riff-24khz-16bit-mono-pcm".to_string();
        assert_eq!(
            MicrosoftSpeechAdapter::new(config.clone()).unwrap().format,
            AudioFormat::Wav
        );
        config.output_format = "webm-24khz-16bit-mono-opus".to_string();
        assert_eq!(
            MicrosoftSpeechAdapter::new(config.clone()).unwrap().format,
            AudioFormat::Webm
        );
        config.output_format = "raw-16khz-16bit-mono-pcm".to_string();
        assert!(matches!(
            MicrosoftSpeechAdapter::new(config),
            Err(SynthesisError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn synthesize_posts_ssml_with_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .and(header("Ocp-Apim-Subscription-Key", "azure-key"))
            .and(header("Content-Type", "application/ssml+xml"))
            .and(header("X-Microsoft-OutputFormat", "audio-16khz-128kbitrate-mono-mp3"))
            .and(body_string_contains("name='en-US-JennyNeural'"))
            .and(body_string_contains("Say cheese!"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 256]))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter_with_key(&server, Some("azure-key"));
        let result = adapter
            .synthesize("Say cheese!", "en-US-JennyNeural")
            .await
            .unwrap();

        assert_eq!(result.mime_type(), "audio/mpeg");
        assert_eq!(result.into_bytes().await.unwrap().len(), 256);
    }

    #[tokio::test]
    async fn webm_output_is_labelled_webm() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("X-Microsoft-OutputFormat", "webm-24khz-16bit-mono-opus"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x1A, 0x45, 0xDF, 0xA3]))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = MicrosoftSpeechAdapter::new(MicrosoftConfig {
            api_key: Some(SecretString::from("azure-key")),
            base_url: Some(server.uri()),
            output_format: "webm-24khz-16bit-mono-opus".to_string(),
            ..Default::default()
        })
        .unwrap();
        let result = adapter.synthesize("Hello", "en-US-JennyNeural").await.unwrap();

        assert_eq!(result.mime_type(), "audio/webm");
        assert_eq!(result.suggested_filename(), "speech.webm");
    }

    #[tokio::test]
    async fn missing_key_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        for key in [None, Some("   ")] {
            let result = adapter_with_key(&server, key)
                .synthesize("Hello", "en-US-JennyNeural")
                .await;
            assert!(matches!(result, Err(SynthesisError::MissingCredentials(_))));
        }
    }

    #[tokio::test]
    async fn unauthorized_is_backend_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let result = adapter_with_key(&server, Some("wrong"))
            .synthesize("Hello", "en-US-JennyNeural")
            .await;

        assert!(matches!(result, Err(SynthesisError::BackendUnavailable(ref m)) if m.contains("401")));
    }

    #[tokio::test]
    async fn lists_static_voices_with_gender() {
        let server = MockServer::start().await;
        let voices = adapter_with_key(&server, None).list_voices().await.unwrap();

        let jenny = voices.iter().find(|v| v.id == "en-US-JennyNeural").unwrap();
        assert_eq!(jenny.display_name, "Jenny");
        assert_eq!(jenny.gender, VoiceGender::Female);
        assert_eq!(jenny.language.as_deref(), Some("en-US"));
    }
}
