//! Application state shared across handlers

use std::sync::Arc;

use speech_gateway::SynthesisGateway;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Gateway over every enabled synthesis engine
    pub gateway: Arc<SynthesisGateway>,
}

impl AppState {
    /// Wrap a gateway for sharing across handlers
    #[must_use]
    pub fn new(gateway: SynthesisGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}
