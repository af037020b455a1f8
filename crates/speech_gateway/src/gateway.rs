//! Synthesis gateway
//!
//! Single entry point for callers: validates the request, picks the adapter
//! for the requested engine, fills in the default voice and delegates. Every
//! failure leaves as a classified [`SynthesisError`]; nothing is retried.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::catalog::VoiceCatalog;
use crate::config::GatewayConfig;
use crate::error::SynthesisError;
use crate::ports::BackendAdapter;
use crate::providers::{
    ElevenLabsAdapter, GoogleTranslateAdapter, MicrosoftSpeechAdapter, OpenAISpeechAdapter,
    OpenTtsAdapter, PiperAdapter,
};
use crate::registry::AdapterRegistry;
use crate::transcode::TranscodeStage;
use crate::types::{
    AudioBody, EngineId, EngineInfo, SynthesisRequest, SynthesisResult, VoiceDescriptor,
};

/// Dispatches synthesis requests to registered backend adapters
#[derive(Debug, Clone)]
pub struct SynthesisGateway {
    registry: AdapterRegistry,
    catalog: VoiceCatalog,
    transcode: Option<TranscodeStage>,
}

impl SynthesisGateway {
    /// Create a gateway over an existing registry
    #[must_use]
    pub fn new(registry: AdapterRegistry) -> Self {
        Self {
            catalog: VoiceCatalog::new(registry.clone()),
            registry,
            transcode: None,
        }
    }

    /// Attach the transcoding stage used by local engines
    #[must_use]
    pub fn with_transcode(mut self, transcode: Option<TranscodeStage>) -> Self {
        self.transcode = transcode;
        self
    }

    /// Build every enabled adapter from configuration
    ///
    /// # Errors
    ///
    /// Returns `SynthesisError::Configuration` if the configuration is invalid
    /// or an adapter cannot be constructed.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, SynthesisError> {
        config.validate().map_err(SynthesisError::Configuration)?;

        let mut adapters: Vec<Arc<dyn BackendAdapter>> = Vec::new();
        let mut transcode = None;
        if config.piper.enabled {
            transcode = TranscodeStage::from_config(&config.transcode);
            adapters.push(Arc::new(PiperAdapter::new(
                config.piper.clone(),
                transcode.clone(),
            )?));
        }
        if config.google.enabled {
            adapters.push(Arc::new(GoogleTranslateAdapter::new(config.google.clone())?));
        }
        if config.microsoft.enabled {
            adapters.push(Arc::new(MicrosoftSpeechAdapter::new(
                config.microsoft.clone(),
            )?));
        }
        if config.elevenlabs.enabled {
            adapters.push(Arc::new(ElevenLabsAdapter::new(config.elevenlabs.clone())?));
        }
        if config.openai.enabled {
            adapters.push(Arc::new(OpenAISpeechAdapter::new(config.openai.clone())?));
        }
        if config.opentts.enabled {
            adapters.push(Arc::new(OpenTtsAdapter::new(config.opentts.clone())?));
        }

        let registry = AdapterRegistry::new(adapters, config.default_engine);
        info!(
            engines = ?registry.engines(),
            default_engine = %registry.default_engine(),
            "Synthesis gateway ready"
        );
        Ok(Self::new(registry).with_transcode(transcode))
    }

    /// Synthesize speech for a request
    ///
    /// # Errors
    ///
    /// - `UnsupportedEngine` if the engine is unknown or not enabled
    /// - `InvalidRequest` if the text is empty after trimming
    /// - the adapter's classified error otherwise
    #[instrument(skip(self, request), fields(engine = %request.engine, text_len = request.text.len()))]
    pub async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResult, SynthesisError> {
        let adapter = self.registry.resolve(&request.engine)?;

        let text = request.text.trim();
        if text.is_empty() {
            return Err(SynthesisError::InvalidRequest(
                "text must not be empty".to_string(),
            ));
        }

        let engine = adapter.engine();
        let voice = request.voice().unwrap_or_else(|| adapter.default_voice());
        let limit = adapter.max_text_chars();
        if text.chars().count() > limit {
            debug!(%engine, limit, "Text exceeds engine limit and will be truncated");
        }
        debug!(%engine, voice, "Dispatching synthesis");

        let result = adapter.synthesize(text, voice).await.inspect_err(|e| {
            warn!(%engine, kind = %e.kind(), error = %e, "Synthesis failed");
        })?;

        if let AudioBody::Buffered(audio) = result.body() {
            if audio.is_empty() {
                warn!(%engine, "Backend returned empty audio");
                return Err(SynthesisError::SynthesisFailed(format!(
                    "{engine} returned no audio"
                )));
            }
        }

        debug!(%engine, mime_type = result.mime_type(), streamed = result.is_streamed(), "Synthesis complete");
        Ok(result)
    }

    /// List the voices of an engine (blank selects the default engine)
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEngine` for unknown engines or the catalog error.
    pub async fn list_voices(&self, engine: &str) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
        self.catalog.list_voices(engine).await
    }

    /// Limits and default voices of the enabled engines
    #[must_use]
    pub fn describe_engines(&self) -> Vec<EngineInfo> {
        self.registry.describe()
    }

    /// Whether MP3 transcoding can run, or `None` when it is not configured
    pub async fn transcode_available(&self) -> Option<bool> {
        match &self.transcode {
            Some(stage) => Some(stage.is_available().await),
            None => None,
        }
    }

    /// Enabled engines in id order
    #[must_use]
    pub fn engines(&self) -> Vec<EngineId> {
        self.registry.engines()
    }

    /// Engine used when a request names none
    #[must_use]
    pub const fn default_engine(&self) -> EngineId {
        self.registry.default_engine()
    }
}
