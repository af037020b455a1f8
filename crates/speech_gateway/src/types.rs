//! Types for speech synthesis
//!
//! Contains the request/result data structures, engine identifiers, audio
//! formats and voice descriptors shared by every adapter.

use std::fmt;
use std::pin::Pin;
use std::str::FromStr;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::SynthesisError;

/// Identifier of a synthesis engine
///
/// This is a closed set agreed with callers. Adding a backend means adding an
/// adapter and a variant here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EngineId {
    /// Local Piper executable
    #[default]
    Piper,
    /// Google Translate speech endpoint
    Google,
    /// Microsoft Azure Cognitive Services speech
    Microsoft,
    /// ElevenLabs text-to-speech API
    #[serde(rename = "elevenlabs")]
    ElevenLabs,
    /// OpenAI speech API
    #[serde(rename = "openai")]
    OpenAI,
    /// Self-hosted OpenTTS server, streamed through
    #[serde(rename = "opentts")]
    OpenTts,
}

impl EngineId {
    /// Every known engine, in display order
    pub const ALL: [Self; 6] = [
        Self::Piper,
        Self::Google,
        Self::Microsoft,
        Self::ElevenLabs,
        Self::OpenAI,
        Self::OpenTts,
    ];

    /// Wire name of the engine
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Piper => "piper",
            Self::Google => "google",
            Self::Microsoft => "microsoft",
            Self::ElevenLabs => "elevenlabs",
            Self::OpenAI => "openai",
            Self::OpenTts => "opentts",
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineId {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "piper" | "process-local" => Ok(Self::Piper),
            "google" => Ok(Self::Google),
            "microsoft" | "azure" => Ok(Self::Microsoft),
            "elevenlabs" => Ok(Self::ElevenLabs),
            "openai" => Ok(Self::OpenAI),
            "opentts" | "streaming-proxy" => Ok(Self::OpenTts),
            _ => Err(SynthesisError::UnsupportedEngine(s.to_string())),
        }
    }
}

/// Audio formats produced by the supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MP3 format
    Mp3,
    /// WAV format (uncompressed)
    Wav,
    /// OGG container
    Ogg,
    /// Opus codec
    Opus,
    /// FLAC format (lossless)
    Flac,
    /// WebM container (Opus or Vorbis)
    Webm,
}

impl AudioFormat {
    /// Get the MIME type for this audio format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
            Self::Opus => "audio/opus",
            Self::Flac => "audio/flac",
            Self::Webm => "audio/webm",
        }
    }

    /// Get the file extension for this audio format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
            Self::Flac => "flac",
            Self::Webm => "webm",
        }
    }

    /// Parse audio format from MIME type
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        // Handle compound MIME types like "audio/ogg; codecs=opus"
        let base_mime = mime.split(';').next().unwrap_or(mime).trim();

        match base_mime.to_lowercase().as_str() {
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(Self::Wav),
            "audio/ogg" => {
                if mime.contains("codecs=opus") {
                    Some(Self::Opus)
                } else {
                    Some(Self::Ogg)
                }
            },
            "audio/opus" => Some(Self::Opus),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            "audio/webm" => Some(Self::Webm),
            _ => None,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A single synthesis request
///
/// Created per call and discarded once the result is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Text to speak
    pub text: String,
    /// Engine id; empty selects the configured default engine
    #[serde(default)]
    pub engine: String,
    /// Voice id; empty or missing selects the engine's default voice
    #[serde(default)]
    pub voice: Option<String>,
}

impl SynthesisRequest {
    /// Create a request for the given engine with the default voice
    #[must_use]
    pub fn new(text: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            engine: engine.into(),
            voice: None,
        }
    }

    /// Set the voice id
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// The requested voice, treating blank ids as absent
    #[must_use]
    pub fn voice(&self) -> Option<&str> {
        self.voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Voice gender classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    /// Male voice
    Male,
    /// Female voice
    Female,
    /// Neutral/androgynous voice
    Neutral,
    /// Not reported by the backend
    #[default]
    Unspecified,
}

impl VoiceGender {
    /// Parse the loose gender labels backends report ("M", "female", ...)
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "m" | "male" => Self::Male,
            "f" | "female" => Self::Female,
            "neutral" | "non-binary" | "nonbinary" => Self::Neutral,
            _ => Self::Unspecified,
        }
    }
}

/// Information about a voice offered by an engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// Voice identifier, passed back as `voice` in requests
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// Voice gender
    #[serde(default)]
    pub gender: VoiceGender,
    /// Language or locale, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl VoiceDescriptor {
    /// Create a new voice descriptor with unspecified gender
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            gender: VoiceGender::Unspecified,
            language: None,
        }
    }

    /// Set the gender
    #[must_use]
    pub const fn with_gender(mut self, gender: VoiceGender) -> Self {
        self.gender = gender;
        self
    }

    /// Set the language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Limits and defaults of a registered engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Engine id
    pub id: EngineId,
    /// Voice used when a request names none
    pub default_voice: String,
    /// Longer texts are truncated to this many characters
    pub max_text_chars: usize,
}

/// Chunked audio delivered as it arrives from the backend
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes, SynthesisError>> + Send>>;

/// Audio payload of a synthesis result
pub enum AudioBody {
    /// Fully buffered audio
    Buffered(Bytes),
    /// Audio relayed incrementally from an upstream service
    Stream(AudioStream),
}

impl fmt::Debug for AudioBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Playable audio produced by an engine
#[derive(Debug)]
pub struct SynthesisResult {
    body: AudioBody,
    mime_type: String,
    suggested_filename: String,
}

impl SynthesisResult {
    /// Create a result from fully buffered audio
    #[must_use]
    pub fn buffered(data: impl Into<Bytes>, format: AudioFormat) -> Self {
        Self {
            body: AudioBody::Buffered(data.into()),
            mime_type: format.mime_type().to_string(),
            suggested_filename: format!("speech.{}", format.extension()),
        }
    }

    /// Create a result relaying an upstream stream with its own content type
    #[must_use]
    pub fn streamed(stream: AudioStream, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        let extension = AudioFormat::from_mime_type(&mime_type).map_or("audio", |f| f.extension());
        Self {
            body: AudioBody::Stream(stream),
            suggested_filename: format!("speech.{extension}"),
            mime_type,
        }
    }

    /// MIME type of the audio
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Suggested download filename
    #[must_use]
    pub fn suggested_filename(&self) -> &str {
        &self.suggested_filename
    }

    /// Borrow the audio body
    #[must_use]
    pub const fn body(&self) -> &AudioBody {
        &self.body
    }

    /// Consume the result and return its body
    #[must_use]
    pub fn into_body(self) -> AudioBody {
        self.body
    }

    /// Whether the audio is relayed as a stream
    #[must_use]
    pub const fn is_streamed(&self) -> bool {
        matches!(self.body, AudioBody::Stream(_))
    }

    /// Collect the whole body into memory
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a streamed body.
    pub async fn into_bytes(self) -> Result<Bytes, SynthesisError> {
        match self.body {
            AudioBody::Buffered(bytes) => Ok(bytes),
            AudioBody::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod engine_id {
        use super::*;

        #[test]
        fn parses_wire_names() {
            for engine in EngineId::ALL {
                assert_eq!(engine.as_str().parse::<EngineId>().unwrap(), engine);
            }
        }

        #[test]
        fn parses_aliases_case_insensitively() {
            assert_eq!("Process-Local".parse::<EngineId>().unwrap(), EngineId::Piper);
            assert_eq!("streaming-proxy".parse::<EngineId>().unwrap(), EngineId::OpenTts);
            assert_eq!(" AZURE ".parse::<EngineId>().unwrap(), EngineId::Microsoft);
        }

        #[test]
        fn unknown_engine_is_unsupported() {
            let err = "unknown-engine".parse::<EngineId>().unwrap_err();
            assert!(matches!(err, SynthesisError::UnsupportedEngine(ref e) if e == "unknown-engine"));
        }

        #[test]
        fn serializes_as_wire_name() {
            let json = serde_json::to_string(&EngineId::ElevenLabs).unwrap();
            assert_eq!(json, "\"elevenlabs\"");
            let parsed: EngineId = serde_json::from_str("\"opentts\"").unwrap();
            assert_eq!(parsed, EngineId::OpenTts);
        }
    }

    mod audio_format {
        use super::*;

        #[test]
        fn mime_types_are_correct() {
            assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
            assert_eq!(AudioFormat::Wav.mime_type(), "audio/wav");
            assert_eq!(AudioFormat::Ogg.mime_type(), "audio/ogg");
            assert_eq!(AudioFormat::Opus.mime_type(), "audio/opus");
            assert_eq!(AudioFormat::Flac.mime_type(), "audio/flac");
            assert_eq!(AudioFormat::Webm.mime_type(), "audio/webm");
        }

        #[test]
        fn from_mime_type_handles_aliases_and_params() {
            assert_eq!(AudioFormat::from_mime_type("audio/x-wav"), Some(AudioFormat::Wav));
            assert_eq!(AudioFormat::from_mime_type("audio/mp3"), Some(AudioFormat::Mp3));
            assert_eq!(
                AudioFormat::from_mime_type("audio/ogg; codecs=opus"),
                Some(AudioFormat::Opus)
            );
            assert_eq!(AudioFormat::from_mime_type("text/html"), None);
        }
    }

    mod request {
        use super::*;

        #[test]
        fn blank_voice_is_absent() {
            let request = SynthesisRequest::new("Hi", "piper").with_voice("  ");
            assert_eq!(request.voice(), None);
        }

        #[test]
        fn voice_is_trimmed() {
            let request = SynthesisRequest::new("Hi", "google").with_voice(" de ");
            assert_eq!(request.voice(), Some("de"));
        }
    }

    mod voice {
        use super::*;

        #[test]
        fn gender_labels() {
            assert_eq!(VoiceGender::from_label("M"), VoiceGender::Male);
            assert_eq!(VoiceGender::from_label("female"), VoiceGender::Female);
            assert_eq!(VoiceGender::from_label("neutral"), VoiceGender::Neutral);
            assert_eq!(VoiceGender::from_label("robot"), VoiceGender::Unspecified);
        }

        #[test]
        fn descriptor_serializes_without_missing_language() {
            let voice = VoiceDescriptor::new("en", "English").with_gender(VoiceGender::Female);
            let json = serde_json::to_value(&voice).unwrap();
            assert_eq!(json["id"], "en");
            assert_eq!(json["display_name"], "English");
            assert_eq!(json["gender"], "female");
            assert!(json.get("language").is_none());
        }
    }

    mod result {
        use super::*;

        #[test]
        fn buffered_result_derives_filename() {
            let result = SynthesisResult::buffered(vec![1, 2, 3], AudioFormat::Mp3);
            assert_eq!(result.mime_type(), "audio/mpeg");
            assert_eq!(result.suggested_filename(), "speech.mp3");
            assert!(!result.is_streamed());
        }

        #[tokio::test]
        async fn streamed_result_collects_chunks() {
            let chunks: Vec<Result<Bytes, SynthesisError>> = vec![
                Ok(Bytes::from_static(b"RIFF")),
                Ok(Bytes::from_static(b"WAVE")),
            ];
            let stream: AudioStream = Box::pin(futures::stream::iter(chunks));
            let result = SynthesisResult::streamed(stream, "audio/wav");

            assert!(result.is_streamed());
            assert_eq!(result.suggested_filename(), "speech.wav");
            let bytes = result.into_bytes().await.unwrap();
            assert_eq!(&bytes[..], b"RIFFWAVE");
        }

        #[tokio::test]
        async fn streamed_result_surfaces_mid_stream_error() {
            let chunks: Vec<Result<Bytes, SynthesisError>> = vec![
                Ok(Bytes::from_static(b"RIFF")),
                Err(SynthesisError::BackendUnavailable("reset".to_string())),
            ];
            let stream: AudioStream = Box::pin(futures::stream::iter(chunks));
            let result = SynthesisResult::streamed(stream, "audio/x-unknown");

            assert_eq!(result.suggested_filename(), "speech.audio");
            assert!(result.into_bytes().await.is_err());
        }
    }
}
