//! OpenTTS streaming proxy
//!
//! Forwards requests to a self-hosted OpenTTS server and relays the audio
//! body chunk by chunk. The first non-empty chunk is read before a result is
//! returned, so an upstream that answers with no audio is still reported as
//! an error. The upstream connection is held by a guard that travels with the
//! returned stream and is released when the stream finishes or the consumer
//! drops it early.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::OpenTtsConfig;
use crate::error::SynthesisError;
use crate::ports::BackendAdapter;
use crate::providers::{ensure_success, http_client, truncate_chars};
use crate::types::{AudioFormat, EngineId, SynthesisResult, VoiceDescriptor, VoiceGender};

type UpstreamStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Adapter relaying an OpenTTS server
#[derive(Debug, Clone)]
pub struct OpenTtsAdapter {
    client: Client,
    config: OpenTtsConfig,
    open_connections: Arc<AtomicUsize>,
}

/// Entry of the `/api/voices` map
#[derive(Debug, Deserialize)]
struct RemoteVoice {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    tts_name: Option<String>,
}

impl RemoteVoice {
    fn into_descriptor(self, id: String) -> VoiceDescriptor {
        let name = self.name.unwrap_or_else(|| id.clone());
        let display_name = match self.tts_name {
            Some(tts) => format!("{name} ({tts})"),
            None => name,
        };
        let gender = self
            .gender
            .as_deref()
            .map_or(VoiceGender::Unspecified, VoiceGender::from_label);
        let descriptor = VoiceDescriptor::new(id, display_name).with_gender(gender);
        match self.locale.or(self.language) {
            Some(language) => descriptor.with_language(language),
            None => descriptor,
        }
    }
}

/// Counts one open upstream connection while alive
#[derive(Debug)]
struct ConnectionGuard {
    open: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    fn acquire(open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self {
            open: Arc::clone(open),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
        debug!("Released OpenTTS connection");
    }
}

/// Upstream body relayed to the caller
struct RelayStream {
    first: Option<Bytes>,
    upstream: Option<UpstreamStream>,
    guard: Option<ConnectionGuard>,
}

impl RelayStream {
    fn release(&mut self) {
        self.upstream = None;
        self.guard = None;
    }
}

fn interrupted(e: &reqwest::Error) -> SynthesisError {
    SynthesisError::BackendUnavailable(format!("opentts stream interrupted: {e}"))
}

/// Wait for the first non-empty chunk of the upstream body
async fn first_chunk(upstream: &mut UpstreamStream) -> Result<Bytes, SynthesisError> {
    while let Some(chunk) = upstream.next().await {
        let chunk = chunk.map_err(|e| interrupted(&e))?;
        if !chunk.is_empty() {
            return Ok(chunk);
        }
    }
    Err(SynthesisError::SynthesisFailed(
        "opentts returned no audio".to_string(),
    ))
}

impl Stream for RelayStream {
    type Item = Result<Bytes, SynthesisError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(first) = this.first.take() {
            return Poll::Ready(Some(Ok(first)));
        }
        let Some(upstream) = this.upstream.as_mut() else {
            return Poll::Ready(None);
        };

        match upstream.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(e))) => {
                warn!(error = %e, "OpenTTS stream interrupted");
                this.release();
                Poll::Ready(Some(Err(interrupted(&e))))
            },
            Poll::Ready(None) => {
                this.release();
                Poll::Ready(None)
            },
        }
    }
}

impl OpenTtsAdapter {
    /// Create a new adapter
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the HTTP client cannot be built.
    pub fn new(config: OpenTtsConfig) -> Result<Self, SynthesisError> {
        let client = http_client(config.timeout_ms)?;
        Ok(Self {
            client,
            config,
            open_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Upstream connections currently held by undelivered streams
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.open_connections.load(Ordering::SeqCst)
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}

/// Upstream content type if it names audio, else WAV
fn audio_content_type(header: Option<&str>) -> String {
    header
        .filter(|raw| {
            raw.parse::<mime::Mime>()
                .is_ok_and(|m| m.type_() == mime::AUDIO)
        })
        .map_or_else(|| AudioFormat::Wav.mime_type().to_string(), str::to_string)
}

#[async_trait]
impl BackendAdapter for OpenTtsAdapter {
    fn engine(&self) -> EngineId {
        EngineId::OpenTts
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
            .get(format!("{}/api/tts", self.base_url()))
            .query(&[("voice", voice), ("text", text)])
            .send()
            .await?;

        let guard = ConnectionGuard::acquire(&self.open_connections);
        let response = ensure_success(EngineId::OpenTts, response).await?;

        let mime_type = audio_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );

        let mut upstream: UpstreamStream = Box::pin(response.bytes_stream());
        let first = first_chunk(&mut upstream).await.inspect_err(|e| {
            warn!(error = %e, "OpenTTS sent no audio");
        })?;
        debug!(%mime_type, "Relaying OpenTTS audio");

        let stream = RelayStream {
            first: Some(first),
            upstream: Some(upstream),
            guard: Some(guard),
        };

        Ok(SynthesisResult::streamed(Box::pin(stream), mime_type))
    }

    #[instrument(skip(self))]
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
        let response = self
            .client
            .get(format!("{}/api/voices", self.base_url()))
            .send()
            .await?;

        let voices: BTreeMap<String, RemoteVoice> = ensure_success(EngineId::OpenTts, response)
            .await?
            .json()
            .await
            .map_err(|e| {
                SynthesisError::BackendUnavailable(format!("Invalid opentts voice list: {e}"))
            })?;

        debug!(count = voices.len(), "Fetched OpenTTS voices");
        Ok(voices
            .into_iter()
            .map(|(id, voice)| voice.into_descriptor(id))
            .collect())
    }
}
