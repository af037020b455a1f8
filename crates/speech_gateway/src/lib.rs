//! Speech gateway - one synthesis interface over many text-to-speech backends
//!
//! Callers hand a [`SynthesisRequest`] to the [`SynthesisGateway`] and get
//! back playable audio or a classified [`SynthesisError`].
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` defines [`BackendAdapter`], the capability every engine offers
//! - `providers` contains one adapter per engine
//! - `registry` maps engine ids to adapters built from [`GatewayConfig`]
//! - `gateway` and `catalog` are the caller-facing services
//!
//! # Supported engines
//!
//! | Engine | Kind | Output |
//! |--------|------|--------|
//! | `piper` | local process, optional FFmpeg transcode | MP3 or WAV |
//! | `google` | Google Translate endpoint | MP3 |
//! | `microsoft` | Azure neural voices (SSML) | configured format |
//! | `elevenlabs` | ElevenLabs API | MP3 |
//! | `openai` | OpenAI speech API | MP3 |
//! | `opentts` | self-hosted OpenTTS, streamed | upstream type |
//!
//! # Example
//!
//! ```ignore
//! use speech_gateway::{GatewayConfig, SynthesisGateway, SynthesisRequest};
//!
//! let gateway = SynthesisGateway::from_config(&GatewayConfig::default())?;
//! let result = gateway
//!     .synthesize(&SynthesisRequest::new("Get ready!", "piper"))
//!     .await?;
//! println!("{} ({})", result.suggested_filename(), result.mime_type());
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ports;
pub mod providers;
pub mod registry;
pub mod transcode;
pub mod types;

#[cfg(test)]
mod test_support;

pub use catalog::VoiceCatalog;
pub use config::{
    ElevenLabsConfig, GatewayConfig, GoogleConfig, MicrosoftConfig, OpenAIConfig, OpenTtsConfig,
    PiperConfig, TranscodeConfig,
};
pub use error::{ErrorKind, SynthesisError};
pub use gateway::SynthesisGateway;
pub use ports::BackendAdapter;
pub use providers::{
    ElevenLabsAdapter, GoogleTranslateAdapter, MicrosoftSpeechAdapter, OpenAISpeechAdapter,
    OpenTtsAdapter, PiperAdapter,
};
pub use registry::AdapterRegistry;
pub use transcode::TranscodeStage;
pub use types::{
    AudioBody, AudioFormat, AudioStream, EngineId, EngineInfo, SynthesisRequest, SynthesisResult,
    VoiceDescriptor, VoiceGender,
};
