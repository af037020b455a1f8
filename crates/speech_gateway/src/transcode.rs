//! WAV to MP3 transcoding
//!
//! Uses FFmpeg when it is installed. Transcoding is an enhancement: any
//! failure leaves the original WAV in place and the caller serves that.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::config::TranscodeConfig;
use crate::error::SynthesisError;
use crate::types::AudioFormat;

/// Audio file chosen after the transcode attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutcome {
    /// File holding the audio to return
    pub path: PathBuf,
    /// Format of that file
    pub format: AudioFormat,
}

/// FFmpeg-backed transcoding step
#[derive(Debug, Clone)]
pub struct TranscodeStage {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl TranscodeStage {
    /// Build the stage from configuration, or `None` when disabled
    #[must_use]
    pub fn from_config(config: &TranscodeConfig) -> Option<Self> {
        config.enabled.then(|| Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Create a stage with a custom FFmpeg path
    #[must_use]
    pub fn with_ffmpeg_path(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: path.into(),
            timeout,
        }
    }

    /// Check if FFmpeg is available on the system
    #[instrument(skip(self))]
    pub async fn is_available(&self) -> bool {
        let status = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        matches!(
            tokio::time::timeout(self.timeout, status).await,
            Ok(Ok(status)) if status.success()
        )
    }

    /// Convert the WAV at `source` into an MP3 next to it
    ///
    /// # Errors
    ///
    /// Returns `SynthesisFailed` if FFmpeg is missing, times out, exits
    /// non-zero or writes nothing.
    #[instrument(skip(self), fields(source = %source.display()))]
    pub async fn convert(&self, source: &Path) -> Result<PathBuf, SynthesisError> {
        let target = source.with_extension(AudioFormat::Mp3.extension());

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(source)
            .args(["-codec:a", "libmp3lame", "-q:a", "2"])
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running ffmpeg: {:?}", cmd);

        let child = cmd
            .spawn()
            .map_err(|e| SynthesisError::SynthesisFailed(format!("Failed to spawn FFmpeg: {e}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                SynthesisError::SynthesisFailed(format!(
                    "FFmpeg timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?
            .map_err(|e| SynthesisError::SynthesisFailed(format!("Failed to wait for FFmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SynthesisError::SynthesisFailed(format!(
                "FFmpeg conversion failed: {}",
                stderr.trim()
            )));
        }

        match tokio::fs::metadata(&target).await {
            Ok(meta) if meta.len() > 0 => Ok(target),
            _ => Err(SynthesisError::SynthesisFailed(
                "FFmpeg produced empty output".to_string(),
            )),
        }
    }

    /// Transcode `wav`, falling back to it on any failure
    ///
    /// Whichever file is not returned is removed.
    pub async fn apply(&self, wav: &Path) -> TranscodeOutcome {
        match self.convert(wav).await {
            Ok(mp3) => {
                remove_quietly(wav).await;
                TranscodeOutcome {
                    path: mp3,
                    format: AudioFormat::Mp3,
                }
            },
            Err(e) => {
                warn!(error = %e, "Transcoding unavailable, serving WAV");
                remove_quietly(&wav.with_extension(AudioFormat::Mp3.extension())).await;
                TranscodeOutcome {
                    path: wav.to_path_buf(),
                    format: AudioFormat::Wav,
                }
            },
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "Failed to remove scratch file");
        }
    }
}
