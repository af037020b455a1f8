//! Voice catalog
//!
//! [`VoiceCatalog`] answers "which voices does engine X offer right now".
//! Static lists and remote catalogs live in the adapters; this module also
//! holds the model directory scan used by local engines.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::error::SynthesisError;
use crate::registry::AdapterRegistry;
use crate::types::VoiceDescriptor;

/// Voice listing across all registered engines
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    registry: AdapterRegistry,
}

impl VoiceCatalog {
    /// Create a catalog over the given registry
    #[must_use]
    pub const fn new(registry: AdapterRegistry) -> Self {
        Self { registry }
    }

    /// List the voices of `engine` (blank selects the default engine)
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEngine` for unknown engines and the adapter's error
    /// for remote catalogs that cannot be queried.
    #[instrument(skip(self))]
    pub async fn list_voices(&self, engine: &str) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
        let adapter = self.registry.resolve(engine)?;
        let voices = adapter.list_voices().await?;
        debug!(engine = %adapter.engine(), count = voices.len(), "Listed voices");
        Ok(voices)
    }
}

/// Recursively find model files with `extension` under `root`
///
/// Results are sorted by path so repeated scans agree with each other.
///
/// # Errors
///
/// Returns the I/O error if `root` itself cannot be read. Unreadable
/// subdirectories are skipped.
pub fn find_model_files(root: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    let mut is_root = true;

    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if is_root => return Err(e),
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            },
        };
        is_root = false;

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Voice id of a model: its path relative to `root` with `/` separators
#[must_use]
pub fn model_voice_id(root: &Path, model: &Path) -> String {
    let relative = model.strip_prefix(root).unwrap_or(model);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Describe a model file, e.g. `en_US-amy-low.onnx` as "amy (en_US, low)"
#[must_use]
pub fn describe_model(root: &Path, model: &Path) -> VoiceDescriptor {
    let id = model_voice_id(root, model);
    let stem = model
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(id.as_str());

    let parts: Vec<&str> = stem.split('-').collect();
    match parts.as_slice() {
        [locale, speaker, quality, ..] => {
            VoiceDescriptor::new(id.clone(), format!("{speaker} ({locale}, {quality})"))
                .with_language(locale.replace('_', "-"))
        },
        [locale, speaker] => VoiceDescriptor::new(id.clone(), format!("{speaker} ({locale})"))
            .with_language(locale.replace('_', "-")),
        _ => VoiceDescriptor::new(id.clone(), stem.replace('_', " ")),
    }
}

/// List the models under `root` as voices
///
/// A missing or unreadable directory yields an empty list and a warning.
#[must_use]
pub fn scan_model_dir(root: &Path, extension: &str) -> Vec<VoiceDescriptor> {
    match find_model_files(root, extension) {
        Ok(models) => models.iter().map(|m| describe_model(root, m)).collect(),
        Err(e) => {
            warn!(dir = %root.display(), error = %e, "Cannot scan model directory");
            Vec::new()
        },
    }
}
