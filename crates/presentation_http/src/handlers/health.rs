//! Health check handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use speech_gateway::EngineId;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness check - is the server running?
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub default_engine: EngineId,
    pub engines: Vec<EngineId>,
    /// FFmpeg availability; absent when transcoding is not configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcode_available: Option<bool>,
}

/// Readiness check - is at least the default engine available?
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let engines = state.gateway.engines();
    let default_engine = state.gateway.default_engine();
    let ready = engines.contains(&default_engine);
    // Missing FFmpeg only degrades MP3 output to WAV
    let transcode_available = state.gateway.transcode_available().await;

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            ready,
            default_engine,
            engines,
            transcode_available,
        }),
    )
}
