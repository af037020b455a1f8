//! Piper local speech synthesis
//!
//! Runs the Piper CLI once per request. Each call gets its own scratch
//! directory which is removed when the call finishes, whatever the outcome.
//! Concurrent invocations are bounded by a semaphore; requests that cannot
//! get a slot within the queue timeout fail with `Overloaded`.
//!
//! # Model layout
//!
//! Voices are model files under `models_dir`, addressed by their path
//! relative to it:
//!
//! ```text
//! /app/piper/models/
//! ├── en_US-amy-low.onnx
//! ├── en_US-amy-low.onnx.json
//! └── de/de_DE/de_DE-thorsten-medium.onnx
//! ```
//!
//! A `<model>.json` sidecar next to a model is passed as `--config`.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, instrument, warn};

use crate::catalog::{find_model_files, model_voice_id, scan_model_dir};
use crate::config::PiperConfig;
use crate::error::SynthesisError;
use crate::ports::BackendAdapter;
use crate::providers::truncate_chars;
use crate::transcode::{TranscodeOutcome, TranscodeStage};
use crate::types::{AudioFormat, EngineId, SynthesisResult, VoiceDescriptor};

/// Voice id meaning "first model found"
pub const AUTO_VOICE: &str = "auto";

/// Scratch directory name prefix
const SCRATCH_PREFIX: &str = "speechgate-";

/// Local engine driving the Piper executable
#[derive(Debug, Clone)]
pub struct PiperAdapter {
    config: PiperConfig,
    transcode: Option<TranscodeStage>,
    slots: Arc<Semaphore>,
    default_voice: String,
}

impl PiperAdapter {
    /// Create a new Piper adapter
    ///
    /// # Errors
    ///
    /// Returns `SynthesisError::Configuration` if the configuration is invalid.
    pub fn new(
        config: PiperConfig,
        transcode: Option<TranscodeStage>,
    ) -> Result<Self, SynthesisError> {
        config.validate().map_err(SynthesisError::Configuration)?;

        let default_voice = config
            .default_model
            .as_deref()
            .map_or_else(|| AUTO_VOICE.to_string(), |m| model_voice_id(&config.models_dir, m));

        Ok(Self {
            slots: Arc::new(Semaphore::new(config.max_concurrent)),
            config,
            transcode,
            default_voice,
        })
    }

    /// Invocation slots currently free
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit, SynthesisError> {
        let waiting = tokio::time::timeout(
            self.config.queue_timeout(),
            Arc::clone(&self.slots).acquire_owned(),
        );

        match waiting.await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(SynthesisError::Overloaded(
                "piper worker pool is shut down".to_string(),
            )),
            Err(_) => {
                warn!(
                    max_concurrent = self.config.max_concurrent,
                    "No free piper slot within queue timeout"
                );
                Err(SynthesisError::Overloaded(format!(
                    "all {} piper slots busy for {}ms",
                    self.config.max_concurrent, self.config.queue_timeout_ms
                )))
            },
        }
    }

    /// Map a voice id to a model file
    async fn resolve_model(&self, voice: &str) -> Result<PathBuf, SynthesisError> {
        if voice == self.default_voice || voice == AUTO_VOICE {
            return self.default_model().await;
        }

        let relative = Path::new(voice);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(SynthesisError::InvalidRequest(format!(
                "voice '{voice}' must be a path relative to the models directory"
            )));
        }

        let model = self.config.models_dir.join(relative);
        if is_file(&model).await {
            Ok(model)
        } else {
            Err(SynthesisError::InvalidRequest(format!(
                "unknown piper voice '{voice}'"
            )))
        }
    }

    /// Configured default model, or the first model found
    async fn default_model(&self) -> Result<PathBuf, SynthesisError> {
        if let Some(model) = &self.config.default_model {
            if is_file(model).await {
                return Ok(model.clone());
            }
            warn!(model = %model.display(), "Configured piper model missing, autoselecting");
        }

        let root = self.config.models_dir.clone();
        let extension = self.config.model_extension.clone();
        let models = tokio::task::spawn_blocking(move || find_model_files(&root, &extension))
            .await
            .map_err(|e| SynthesisError::SynthesisFailed(format!("Model scan aborted: {e}")))?
            .unwrap_or_default();

        let model = models.into_iter().next().ok_or_else(|| {
            SynthesisError::SynthesisFailed(format!(
                "no piper models found under '{}'",
                self.config.models_dir.display()
            ))
        })?;
        warn!(model = %model.display(), "Using autoselected piper model");
        Ok(model)
    }

    fn scratch_dir(&self) -> Result<TempDir, SynthesisError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        match &self.config.work_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .map_err(|e| SynthesisError::SynthesisFailed(format!("Failed to create scratch dir: {e}")))
    }

    /// Run Piper, writing a WAV to `output`
    #[instrument(skip(self, text), fields(model = %model.display(), text_len = text.len()))]
    async fn run_piper(&self, text: &str, model: &Path, output: &Path) -> Result<(), SynthesisError> {
        let mut cmd = Command::new(&self.config.executable_path);
        cmd.arg("--model").arg(model);

        let sidecar = sidecar_path(model);
        if is_file(&sidecar).await {
            cmd.arg("--config").arg(&sidecar);
        }

        cmd.arg("--output_file").arg(output);

        if self.config.pass_seed {
            cmd.arg("--seed").arg(fresh_seed().to_string());
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running piper: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SynthesisError::BackendUnavailable(format!(
                    "Piper not found at '{}'",
                    self.config.executable_path.display()
                ))
            } else {
                SynthesisError::SynthesisFailed(format!("Failed to run piper: {e}"))
            }
        })?;

        let stdin = child.stdin.take();
        let line = format!("{text}\n");
        let run = async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(line.as_bytes()).await {
                    debug!(error = %e, "Piper closed stdin early");
                }
            }
            child.wait_with_output().await
        };

        let output_status = tokio::time::timeout(self.config.timeout(), run)
            .await
            .map_err(|_| {
                error!(timeout_ms = self.config.timeout_ms, "Piper timed out");
                SynthesisError::SynthesisFailed(format!(
                    "Piper timed out after {}ms",
                    self.config.timeout_ms
                ))
            })?
            .map_err(|e| SynthesisError::SynthesisFailed(format!("Failed to wait for piper: {e}")))?;

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            error!("Piper failed: {}", stderr);
            return Err(SynthesisError::SynthesisFailed(format!(
                "Piper exited with status {}: {}",
                output_status.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl BackendAdapter for PiperAdapter {
    fn engine(&self) -> EngineId {
        EngineId::Piper
    }

    fn default_voice(&self) -> &str {
        &self.default_voice
    }

    fn max_text_chars(&self) -> usize {
        self.config.max_text_chars
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesisResult, SynthesisError> {
        let text = truncate_chars(text.trim(), self.config.max_text_chars);
        let model = self.resolve_model(voice).await?;
        let _permit = self.acquire_slot().await?;

        let scratch = self.scratch_dir()?;
        let wav = scratch
            .path()
            .join("speech")
            .with_extension(AudioFormat::Wav.extension());

        self.run_piper(text, &model, &wav).await?;

        let outcome = match &self.transcode {
            Some(stage) => stage.apply(&wav).await,
            None => TranscodeOutcome {
                path: wav,
                format: AudioFormat::Wav,
            },
        };

        let audio = tokio::fs::read(&outcome.path).await.map_err(|e| {
            SynthesisError::SynthesisFailed(format!("Piper produced no output file: {e}"))
        })?;

        if audio.is_empty() {
            return Err(SynthesisError::SynthesisFailed(
                "Piper produced empty audio".to_string(),
            ));
        }

        debug!(bytes = audio.len(), format = %outcome.format, "Piper synthesis complete");
        Ok(SynthesisResult::buffered(audio, outcome.format))
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
        let root = self.config.models_dir.clone();
        let extension = self.config.model_extension.clone();

        match tokio::task::spawn_blocking(move || scan_model_dir(&root, &extension)).await {
            Ok(voices) => Ok(voices),
            Err(e) => {
                warn!(error = %e, "Model scan aborted");
                Ok(Vec::new())
            },
        }
    }
}

fn sidecar_path(model: &Path) -> PathBuf {
    let mut path = OsString::from(model.as_os_str());
    path.push(".json");
    PathBuf::from(path)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

fn fresh_seed() -> u64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .map_or(0, i64::unsigned_abs)
}
