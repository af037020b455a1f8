//! Port definitions for speech synthesis
//!
//! Defines the trait every synthesis backend adapter implements.

use async_trait::async_trait;

use crate::error::SynthesisError;
use crate::types::{EngineId, SynthesisResult, VoiceDescriptor};

/// Port for one synthesis backend
///
/// An adapter owns its backend's protocol: request shape, authentication,
/// text limit and output format. The gateway resolves the voice before
/// calling [`BackendAdapter::synthesize`]; the adapter truncates the text to
/// its own limit.
///
/// # Example
///
/// ```ignore
/// use speech_gateway::{BackendAdapter, SynthesisError};
///
/// async fn speak(adapter: &dyn BackendAdapter, text: &str) -> Result<bytes::Bytes, SynthesisError> {
///     let result = adapter.synthesize(text, adapter.default_voice()).await?;
///     result.into_bytes().await
/// }
/// ```
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Engine this adapter serves
    fn engine(&self) -> EngineId;

    /// Voice used when a request names none
    fn default_voice(&self) -> &str;

    /// Maximum number of characters sent to the backend
    fn max_text_chars(&self) -> usize;

    /// Synthesize `text` with `voice`
    ///
    /// # Errors
    ///
    /// Returns a classified `SynthesisError` if no audio could be produced.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesisResult, SynthesisError>;

    /// List the voices this backend currently offers
    ///
    /// # Errors
    ///
    /// Returns `SynthesisError` if a remote catalog cannot be queried.
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AudioFormat;

    struct MockAdapter {
        voice: String,
    }

    #[async_trait]
    impl BackendAdapter for MockAdapter {
        fn engine(&self) -> EngineId {
            EngineId::Google
        }

        fn default_voice(&self) -> &str {
            &self.voice
        }

        fn max_text_chars(&self) -> usize {
            10
        }

        async fn synthesize(
            &self,
            text: &str,
            _voice: &str,
        ) -> Result<SynthesisResult, SynthesisError> {
            Ok(SynthesisResult::buffered(
                text.as_bytes().to_vec(),
                AudioFormat::Mp3,
            ))
        }

        async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
            Ok(vec![VoiceDescriptor::new("en", "English")])
        }
    }

    #[tokio::test]
    async fn adapter_is_object_safe() {
        let adapter: Box<dyn BackendAdapter> = Box::new(MockAdapter {
            voice: "en".to_string(),
        });

        let result = adapter
            .synthesize("Hello", adapter.default_voice())
            .await
            .unwrap();
        assert_eq!(result.mime_type(), "audio/mpeg");
        assert_eq!(&result.into_bytes().await.unwrap()[..], b"Hello");
    }

    #[tokio::test]
    async fn mock_adapter_lists_voices() {
        let adapter = MockAdapter {
            voice: "en".to_string(),
        };
        let voices = adapter.list_voices().await.unwrap();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].id, "en");
        assert_eq!(adapter.engine(), EngineId::Google);
        assert_eq!(adapter.max_text_chars(), 10);
    }
}
