//! Adapter registry
//!
//! Maps engine ids to the adapters built at start-up. The registry is
//! immutable once shared and is cheap to clone.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::SynthesisError;
use crate::ports::BackendAdapter;
use crate::types::{EngineId, EngineInfo};

/// Registered adapters keyed by engine
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: Arc<BTreeMap<EngineId, Arc<dyn BackendAdapter>>>,
    default_engine: EngineId,
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("engines", &self.engines())
            .field("default_engine", &self.default_engine)
            .finish()
    }
}

impl AdapterRegistry {
    /// Build a registry from adapters; later adapters replace earlier ones
    /// serving the same engine
    #[must_use]
    pub fn new(
        adapters: impl IntoIterator<Item = Arc<dyn BackendAdapter>>,
        default_engine: EngineId,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.engine(), adapter))
            .collect();
        Self {
            adapters: Arc::new(adapters),
            default_engine,
        }
    }

    /// Engine used when a request names none
    #[must_use]
    pub const fn default_engine(&self) -> EngineId {
        self.default_engine
    }

    /// Registered engines in id order
    #[must_use]
    pub fn engines(&self) -> Vec<EngineId> {
        self.adapters.keys().copied().collect()
    }

    /// Limits and default voice of every registered engine, in id order
    #[must_use]
    pub fn describe(&self) -> Vec<EngineInfo> {
        self.adapters
            .values()
            .map(|adapter| EngineInfo {
                id: adapter.engine(),
                default_voice: adapter.default_voice().to_string(),
                max_text_chars: adapter.max_text_chars(),
            })
            .collect()
    }

    /// Look up the adapter for an engine id as sent by a caller
    ///
    /// A blank id selects the default engine.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEngine` if the id is unknown or the engine is not
    /// registered.
    pub fn resolve(&self, engine: &str) -> Result<&Arc<dyn BackendAdapter>, SynthesisError> {
        let engine = if engine.trim().is_empty() {
            self.default_engine
        } else {
            engine.parse::<EngineId>()?
        };

        self.adapters.get(&engine).ok_or_else(|| {
            SynthesisError::UnsupportedEngine(format!("{engine} is not enabled"))
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::types::{SynthesisResult, VoiceDescriptor};

    struct StubAdapter(EngineId);

    #[async_trait]
    impl BackendAdapter for StubAdapter {
        fn engine(&self) -> EngineId {
            self.0
        }

        fn default_voice(&self) -> &str {
            "default"
        }

        fn max_text_chars(&self) -> usize {
            100
        }

        async fn synthesize(
            &self,
            _text: &str,
            _voice: &str,
        ) -> Result<SynthesisResult, SynthesisError> {
            Err(SynthesisError::SynthesisFailed("stub".to_string()))
        }

        async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
            Ok(Vec::new())
        }
    }

    fn registry() -> AdapterRegistry {
        AdapterRegistry::new(
            [
                Arc::new(StubAdapter(EngineId::Google)) as Arc<dyn BackendAdapter>,
                Arc::new(StubAdapter(EngineId::Piper)),
            ],
            EngineId::Piper,
        )
    }

    #[test]
    fn resolves_registered_engine() {
        let registry = registry();
        assert_eq!(registry.resolve("google").unwrap().engine(), EngineId::Google);
        assert_eq!(
            registry.resolve("process-local").unwrap().engine(),
            EngineId::Piper
        );
    }

    #[test]
    fn blank_engine_resolves_to_default() {
        let registry = registry();
        assert_eq!(registry.resolve("").unwrap().engine(), EngineId::Piper);
        assert_eq!(registry.resolve("  ").unwrap().engine(), EngineId::Piper);
    }

    #[test]
    fn unknown_engine_is_unsupported() {
        let registry = registry();
        let result = registry.resolve("unknown-engine");
        assert!(matches!(result, Err(SynthesisError::UnsupportedEngine(_))));
    }

    #[test]
    fn known_but_unregistered_engine_is_unsupported() {
        let registry = registry();
        let result = registry.resolve("elevenlabs");
        assert!(
            matches!(result, Err(SynthesisError::UnsupportedEngine(ref m)) if m.contains("elevenlabs"))
        );
    }

    #[test]
    fn engines_are_sorted() {
        let registry = registry();
        assert_eq!(registry.engines(), vec![EngineId::Piper, EngineId::Google]);
    }

    #[test]
    fn describe_reports_limits_in_id_order() {
        let registry = registry();
        let info = registry.describe();
        assert_eq!(
            info.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![EngineId::Piper, EngineId::Google]
        );
        assert_eq!(info[1].default_voice, "default");
        assert_eq!(info[1].max_text_chars, 100);
    }
}
