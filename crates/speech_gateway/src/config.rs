//! Configuration for the synthesis gateway
//!
//! Every engine has its own section with an `enabled` flag. The gateway only
//! reads these values; they are fixed once the gateway is built.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::types::{AudioFormat, EngineId};

const fn default_true() -> bool {
    true
}

/// Return the secret only if it is present and non-blank
pub(crate) fn non_empty_secret(secret: Option<&SecretString>) -> Option<&str> {
    secret
        .map(ExposeSecret::expose_secret)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Engine used when a request names none
    #[serde(default = "default_engine")]
    pub default_engine: EngineId,

    /// Local Piper process engine
    #[serde(default)]
    pub piper: PiperConfig,

    /// Google Translate speech endpoint
    #[serde(default)]
    pub google: GoogleConfig,

    /// Microsoft Azure speech
    #[serde(default)]
    pub microsoft: MicrosoftConfig,

    /// ElevenLabs API
    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,

    /// OpenAI speech API
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Self-hosted OpenTTS proxy
    #[serde(default)]
    pub opentts: OpenTtsConfig,

    /// WAV to MP3 transcoding for local output
    #[serde(default)]
    pub transcode: TranscodeConfig,
}

const fn default_engine() -> EngineId {
    EngineId::Piper
}

impl GatewayConfig {
    /// Whether the given engine is switched on
    #[must_use]
    pub const fn is_enabled(&self, engine: EngineId) -> bool {
        match engine {
            EngineId::Piper => self.piper.enabled,
            EngineId::Google => self.google.enabled,
            EngineId::Microsoft => self.microsoft.enabled,
            EngineId::ElevenLabs => self.elevenlabs.enabled,
            EngineId::OpenAI => self.openai.enabled,
            EngineId::OpenTts => self.opentts.enabled,
        }
    }

    /// Validate the configuration
    ///
    /// Missing API keys are not a validation error; they are reported per
    /// request as `MissingCredentials`.
    ///
    /// # Errors
    ///
    /// Returns an error if any enabled section is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.is_enabled(self.default_engine) {
            return Err(format!(
                "Default engine '{}' is not enabled",
                self.default_engine
            ));
        }
        if self.piper.enabled {
            self.piper.validate()?;
        }
        if self.google.enabled {
            validate_limits("google", self.google.timeout_ms, self.google.max_text_chars)?;
        }
        if self.microsoft.enabled {
            self.microsoft.validate()?;
        }
        if self.elevenlabs.enabled {
            self.elevenlabs.validate()?;
        }
        if self.openai.enabled {
            self.openai.validate()?;
        }
        if self.opentts.enabled {
            validate_limits("opentts", self.opentts.timeout_ms, self.opentts.max_text_chars)?;
        }
        self.transcode.validate()
    }
}

fn validate_limits(engine: &str, timeout_ms: u64, max_text_chars: usize) -> Result<(), String> {
    if timeout_ms == 0 {
        return Err(format!("{engine}: timeout must be greater than 0"));
    }
    if max_text_chars == 0 {
        return Err(format!("{engine}: max_text_chars must be greater than 0"));
    }
    Ok(())
}

/// Local Piper engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiperConfig {
    /// Whether the engine is registered
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Piper executable (name in PATH or absolute path)
    #[serde(default = "default_piper_executable")]
    pub executable_path: PathBuf,

    /// Root directory scanned for voice models
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Model used when a request names no voice
    #[serde(default = "default_piper_model")]
    pub default_model: Option<PathBuf>,

    /// Extension of model files inside `models_dir`
    #[serde(default = "default_model_extension")]
    pub model_extension: String,

    /// Directory for per-call scratch files (system temp dir if unset)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Pass a fresh `--seed` on every invocation
    #[serde(default = "default_true")]
    pub pass_seed: bool,

    /// Timeout for one invocation in milliseconds
    #[serde(default = "default_piper_timeout_ms")]
    pub timeout_ms: u64,

    /// Longer text is truncated
    #[serde(default = "default_piper_max_chars")]
    pub max_text_chars: usize,

    /// Maximum concurrent invocations
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// How long a request may wait for a free slot, in milliseconds
    #[serde(default = "default_queue_timeout_ms")]
    pub queue_timeout_ms: u64,
}

fn default_piper_executable() -> PathBuf {
    PathBuf::from("piper")
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("/app/piper/models")
}

#[allow(clippy::unnecessary_wraps)]
fn default_piper_model() -> Option<PathBuf> {
    Some(PathBuf::from("/app/piper/models/en_US-amy-low.onnx"))
}

fn default_model_extension() -> String {
    "onnx".to_string()
}

const fn default_piper_timeout_ms() -> u64 {
    60_000
}

const fn default_piper_max_chars() -> usize {
    5000
}

fn default_max_concurrent() -> usize {
    std::thread::available_parallelism().map_or(2, std::num::NonZeroUsize::get)
}

const fn default_queue_timeout_ms() -> u64 {
    5000
}

impl Default for PiperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            executable_path: default_piper_executable(),
            models_dir: default_models_dir(),
            default_model: default_piper_model(),
            model_extension: default_model_extension(),
            work_dir: None,
            pass_seed: true,
            timeout_ms: default_piper_timeout_ms(),
            max_text_chars: default_piper_max_chars(),
            max_concurrent: default_max_concurrent(),
            queue_timeout_ms: default_queue_timeout_ms(),
        }
    }
}

impl PiperConfig {
    /// Invocation timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Maximum wait for a free invocation slot
    #[must_use]
    pub const fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_limits("piper", self.timeout_ms, self.max_text_chars)?;
        if self.max_concurrent == 0 {
            return Err("piper: max_concurrent must be greater than 0".to_string());
        }
        if self.model_extension.trim_start_matches('.').is_empty() {
            return Err("piper: model_extension must not be empty".to_string());
        }
        Ok(())
    }
}

/// Google Translate speech endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Whether the engine is registered
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the endpoint
    #[serde(default = "default_google_base_url")]
    pub base_url: String,

    /// Language code used when no voice is given
    #[serde(default = "default_google_voice")]
    pub default_voice: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_google_timeout_ms")]
    pub timeout_ms: u64,

    /// Longer text is truncated
    #[serde(default = "default_google_max_chars")]
    pub max_text_chars: usize,
}

fn default_google_base_url() -> String {
    "https://translate.google.com".to_string()
}

fn default_google_voice() -> String {
    "en".to_string()
}

const fn default_google_timeout_ms() -> u64 {
    10_000
}

const fn default_google_max_chars() -> usize {
    200
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_google_base_url(),
            default_voice: default_google_voice(),
            timeout_ms: default_google_timeout_ms(),
            max_text_chars: default_google_max_chars(),
        }
    }
}

/// Microsoft Azure speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicrosoftConfig {
    /// Whether the engine is registered
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Subscription key (sensitive)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Azure region of the speech resource
    #[serde(default = "default_azure_region")]
    pub region: String,

    /// Endpoint override; derived from `region` when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// Neural voice used when no voice is given
    #[serde(default = "default_azure_voice")]
    pub default_voice: String,

    /// Value of the `X-Microsoft-OutputFormat` header
    #[serde(default = "default_azure_output_format")]
    pub output_format: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_azure_timeout_ms")]
    pub timeout_ms: u64,

    /// Longer text is truncated
    #[serde(default = "default_azure_max_chars")]
    pub max_text_chars: usize,
}

fn default_azure_region() -> String {
    "eastus".to_string()
}

fn default_azure_voice() -> String {
    "en-US-JennyNeural".to_string()
}

fn default_azure_output_format() -> String {
    "audio-16khz-128kbitrate-mono-mp3".to_string()
}

const fn default_azure_timeout_ms() -> u64 {
    20_000
}

const fn default_azure_max_chars() -> usize {
    3000
}

impl Default for MicrosoftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            region: default_azure_region(),
            base_url: None,
            default_voice: default_azure_voice(),
            output_format: default_azure_output_format(),
            timeout_ms: default_azure_timeout_ms(),
            max_text_chars: default_azure_max_chars(),
        }
    }
}

impl MicrosoftConfig {
    /// Base URL of the regional speech endpoint
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            format!("https://{}.tts.speech.microsoft.com", self.region)
        })
    }

    /// Container of the configured output format
    ///
    /// Headerless formats (`raw-*`, `amr-*`, `g722-*`) have no playable
    /// container and give `None`.
    #[must_use]
    pub fn audio_format(&self) -> Option<AudioFormat> {
        let format = self.output_format.trim().to_lowercase();
        if format.starts_with("riff-") {
            Some(AudioFormat::Wav)
        } else if format.starts_with("ogg-") {
            Some(AudioFormat::Ogg)
        } else if format.starts_with("webm-") {
            Some(AudioFormat::Webm)
        } else if format.starts_with("audio-") && format.ends_with("-mp3") {
            Some(AudioFormat::Mp3)
        } else if format.starts_with("audio-") && format.ends_with("-opus") {
            Some(AudioFormat::Opus)
        } else {
            None
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if limits are zero or the output format is not playable.
    pub fn validate(&self) -> Result<(), String> {
        validate_limits("microsoft", self.timeout_ms, self.max_text_chars)?;
        if self.audio_format().is_none() {
            return Err(format!(
                "microsoft: unsupported output_format '{}' (use a riff-, ogg-, webm- or mp3 format)",
                self.output_format
            ));
        }
        Ok(())
    }
}

/// ElevenLabs configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    /// Whether the engine is registered
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// API key (sensitive)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// API base URL
    #[serde(default = "default_elevenlabs_base_url")]
    pub base_url: String,

    /// Model id sent with every request
    #[serde(default = "default_elevenlabs_model")]
    pub model_id: String,

    /// Voice id used when no voice is given
    #[serde(default = "default_elevenlabs_voice")]
    pub default_voice: String,

    /// Voice stability (0.0 to 1.0)
    #[serde(default = "default_stability")]
    pub stability: f32,

    /// Similarity boost (0.0 to 1.0)
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,

    /// Synthesis timeout in milliseconds
    #[serde(default = "default_long_timeout_ms")]
    pub timeout_ms: u64,

    /// Voice listing timeout in milliseconds
    #[serde(default = "default_catalog_timeout_ms")]
    pub catalog_timeout_ms: u64,

    /// Longer text is truncated
    #[serde(default = "default_elevenlabs_max_chars")]
    pub max_text_chars: usize,
}

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_elevenlabs_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_elevenlabs_voice() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

const fn default_stability() -> f32 {
    0.5
}

const fn default_similarity_boost() -> f32 {
    0.75
}

const fn default_long_timeout_ms() -> u64 {
    60_000
}

const fn default_catalog_timeout_ms() -> u64 {
    10_000
}

const fn default_elevenlabs_max_chars() -> usize {
    2500
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: default_elevenlabs_base_url(),
            model_id: default_elevenlabs_model(),
            default_voice: default_elevenlabs_voice(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            timeout_ms: default_long_timeout_ms(),
            catalog_timeout_ms: default_catalog_timeout_ms(),
            max_text_chars: default_elevenlabs_max_chars(),
        }
    }
}

impl ElevenLabsConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_limits("elevenlabs", self.timeout_ms, self.max_text_chars)?;
        if self.catalog_timeout_ms == 0 {
            return Err("elevenlabs: catalog timeout must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.stability) {
            return Err(format!(
                "elevenlabs: stability must be between 0.0 and 1.0, got {}",
                self.stability
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_boost) {
            return Err(format!(
                "elevenlabs: similarity_boost must be between 0.0 and 1.0, got {}",
                self.similarity_boost
            ));
        }
        Ok(())
    }
}

/// OpenAI speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Whether the engine is registered
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// OpenAI API key (sensitive)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// OpenAI API base URL (for custom endpoints)
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Text-to-speech model
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Default voice for TTS
    #[serde(default = "default_openai_voice")]
    pub default_voice: String,

    /// TTS speaking speed (0.25 to 4.0)
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Request timeout in milliseconds
    #[serde(default = "default_long_timeout_ms")]
    pub timeout_ms: u64,

    /// Longer text is truncated
    #[serde(default = "default_openai_max_chars")]
    pub max_text_chars: usize,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "tts-1".to_string()
}

fn default_openai_voice() -> String {
    "nova".to_string()
}

const fn default_speed() -> f32 {
    1.0
}

const fn default_openai_max_chars() -> usize {
    4096
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            default_voice: default_openai_voice(),
            speed: default_speed(),
            timeout_ms: default_long_timeout_ms(),
            max_text_chars: default_openai_max_chars(),
        }
    }
}

impl OpenAIConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_limits("openai", self.timeout_ms, self.max_text_chars)?;
        if !(0.25..=4.0).contains(&self.speed) {
            return Err(format!(
                "openai: speed must be between 0.25 and 4.0, got {}",
                self.speed
            ));
        }
        Ok(())
    }
}

/// Self-hosted OpenTTS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenTtsConfig {
    /// Whether the engine is registered
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the OpenTTS server
    #[serde(default = "default_opentts_base_url")]
    pub base_url: String,

    /// Voice used when no voice is given
    #[serde(default = "default_opentts_voice")]
    pub default_voice: String,

    /// Total request timeout in milliseconds, streaming included
    #[serde(default = "default_opentts_timeout_ms")]
    pub timeout_ms: u64,

    /// Longer text is truncated
    #[serde(default = "default_piper_max_chars")]
    pub max_text_chars: usize,
}

fn default_opentts_base_url() -> String {
    "http://localhost:5500".to_string()
}

fn default_opentts_voice() -> String {
    "larynx:harvard-glow_tts".to_string()
}

const fn default_opentts_timeout_ms() -> u64 {
    30_000
}

impl Default for OpenTtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_opentts_base_url(),
            default_voice: default_opentts_voice(),
            timeout_ms: default_opentts_timeout_ms(),
            max_text_chars: default_piper_max_chars(),
        }
    }
}

/// Transcoding of local WAV output to MP3
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Whether transcoding is attempted at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// FFmpeg binary path
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Timeout for one conversion in milliseconds
    #[serde(default = "default_transcode_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

const fn default_transcode_timeout_ms() -> u64 {
    30_000
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ffmpeg_path: default_ffmpeg_path(),
            timeout_ms: default_transcode_timeout_ms(),
        }
    }
}

impl TranscodeConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.timeout_ms == 0 {
            return Err("transcode: timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = GatewayConfig::default();

        assert_eq!(config.default_engine, EngineId::Piper);
        assert_eq!(config.piper.models_dir, PathBuf::from("/app/piper/models"));
        assert_eq!(
            config.piper.default_model,
            Some(PathBuf::from("/app/piper/models/en_US-amy-low.onnx"))
        );
        assert_eq!(config.google.default_voice, "en");
        assert_eq!(config.google.max_text_chars, 200);
        assert_eq!(config.microsoft.default_voice, "en-US-JennyNeural");
        assert_eq!(config.elevenlabs.default_voice, "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(config.openai.default_voice, "nova");
        assert!(config.piper.max_concurrent >= 1);
        assert!(config.microsoft.api_key.is_none());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(GatewayConfig::default().validate().is_ok());
    }

    #[test]
    fn generative_providers_get_longer_timeouts() {
        let config = GatewayConfig::default();
        assert!(config.elevenlabs.timeout_ms > config.google.timeout_ms);
        assert!(config.openai.timeout_ms > config.google.timeout_ms);
    }

    #[test]
    fn validate_fails_when_default_engine_disabled() {
        let mut config = GatewayConfig::default();
        config.piper.enabled = false;
        assert!(config.validate().is_err());

        config.default_engine = EngineId::Google;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_fails_with_zero_timeout() {
        let mut config = GatewayConfig::default();
        config.google.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_ignores_disabled_sections() {
        let mut config = GatewayConfig::default();
        config.openai.speed = 10.0;
        assert!(config.validate().is_err());

        config.openai.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn microsoft_output_format_containers() {
        let mut config = MicrosoftConfig::default();
        assert_eq!(config.audio_format(), Some(AudioFormat::Mp3));

        for (format, expected) in [
            ("riff-24khz-16bit-mono-pcm", AudioFormat::Wav),
            ("ogg-48khz-16bit-mono-opus", AudioFormat::Ogg),
            ("webm-24khz-16bit-mono-opus", AudioFormat::Webm),
            ("audio-24khz-16bit-24kbps-mono-opus", AudioFormat::Opus),
        ] {
            config.output_format = format.to_string();
            assert_eq!(config.audio_format(), Some(expected), "{format}");
            assert!(config.validate().is_ok(), "{format}");
        }
    }

    #[test]
    fn microsoft_rejects_headerless_output() {
        let mut config = GatewayConfig {
            default_engine: EngineId::Google,
            ..Default::default()
        };
        config.microsoft.output_format = "raw-16khz-16bit-mono-pcm".to_string();
        assert_eq!(config.microsoft.audio_format(), None);
        assert!(config.validate().unwrap_err().contains("output_format"));

        config.microsoft.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_fails_with_zero_concurrency() {
        let mut config = GatewayConfig::default();
        config.piper.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fails_with_out_of_range_stability() {
        let mut config = GatewayConfig::default();
        config.elevenlabs.stability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn microsoft_endpoint_derives_from_region() {
        let mut config = MicrosoftConfig {
            region: "westeurope".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint(),
            "https://westeurope.tts.speech.microsoft.com"
        );

        config.base_url = Some("http://127.0.0.1:9000".to_string());
        assert_eq!(config.endpoint(), "http://127.0.0.1:9000");
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let blank = SecretString::from("   ");
        let real = SecretString::from("sk-test");
        assert_eq!(non_empty_secret(Some(&blank)), None);
        assert_eq!(non_empty_secret(Some(&real)), Some("sk-test"));
        assert_eq!(non_empty_secret(None), None);
    }

    #[test]
    fn api_keys_are_not_serialized() {
        let config = ElevenLabsConfig {
            api_key: Some(SecretString::from("xi-secret")),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("xi-secret"));
        assert!(!format!("{config:?}").contains("xi-secret"));
    }

    #[test]
    fn config_deserializes_from_toml() {
        let toml = r#"
            default_engine = "opentts"

            [piper]
            enabled = false

            [microsoft]
            api_key = "azure-key"
            region = "westeurope"

            [opentts]
            base_url = "http://opentts:5500"
            default_voice = "espeak:en"

            [transcode]
            enabled = false
        "#;

        let config: GatewayConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.default_engine, EngineId::OpenTts);
        assert!(!config.piper.enabled);
        assert_eq!(
            non_empty_secret(config.microsoft.api_key.as_ref()),
            Some("azure-key")
        );
        assert_eq!(config.microsoft.region, "westeurope");
        assert_eq!(config.opentts.base_url, "http://opentts:5500");
        assert_eq!(config.opentts.default_voice, "espeak:en");
        assert!(!config.transcode.enabled);
        assert_eq!(config.google.default_voice, "en");
        assert!(config.validate().is_ok());
    }
}
