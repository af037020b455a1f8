//! Route definitions

use axum::{Router, routing::get};
use tower_http::limit::RequestBodyLimitLayer;

use crate::{handlers, state::AppState};

/// Largest JSON synthesis request accepted
const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and status endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Speech API
        .route(
            "/api/tts/speak",
            get(handlers::tts::speak)
                .post(handlers::tts::speak_json)
                .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES)),
        )
        .route("/api/tts/voices", get(handlers::tts::voices))
        .route("/api/tts/engines", get(handlers::tts::engines))
        // Attach state
        .with_state(state)
}
