//! Speech synthesis handlers

use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use speech_gateway::{
    AudioBody, EngineId, EngineInfo, SynthesisRequest, SynthesisResult, VoiceDescriptor,
};
use tracing::{debug, instrument};

use crate::{error::ApiError, extract::ApiJson, state::AppState};

/// Query parameters for `GET /api/tts/speak`
#[derive(Debug, Deserialize)]
pub struct SpeakQuery {
    /// Text to speak
    #[serde(default)]
    pub text: Option<String>,
    /// Engine id (default engine when absent)
    #[serde(default)]
    pub engine: Option<String>,
    /// Voice id (engine default when absent)
    #[serde(default)]
    pub voice: Option<String>,
}

impl SpeakQuery {
    fn into_request(self) -> Result<SynthesisRequest, ApiError> {
        let text = self
            .text
            .ok_or_else(|| ApiError::BadRequest("text is required".to_string()))?;
        Ok(SynthesisRequest {
            text,
            engine: self.engine.unwrap_or_default(),
            voice: self.voice,
        })
    }
}

/// Synthesize speech from query parameters
#[instrument(skip(state, query))]
pub async fn speak(
    State(state): State<AppState>,
    Query(query): Query<SpeakQuery>,
) -> Result<Response, ApiError> {
    let request = query.into_request()?;
    synthesize(&state, &request).await
}

/// Synthesize speech from a JSON body
#[instrument(skip(state, request))]
pub async fn speak_json(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SynthesisRequest>,
) -> Result<Response, ApiError> {
    synthesize(&state, &request).await
}

async fn synthesize(state: &AppState, request: &SynthesisRequest) -> Result<Response, ApiError> {
    let result = state.gateway.synthesize(request).await?;
    debug!(
        mime_type = result.mime_type(),
        streamed = result.is_streamed(),
        "Sending audio"
    );
    Ok(audio_response(result))
}

/// Build the playable response: buffered audio in one piece, streamed audio chunk by chunk
fn audio_response(result: SynthesisResult) -> Response {
    let headers = [
        (CONTENT_TYPE, result.mime_type().to_string()),
        (
            CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", result.suggested_filename()),
        ),
    ];

    let body = match result.into_body() {
        AudioBody::Buffered(audio) => Body::from(audio),
        AudioBody::Stream(stream) => Body::from_stream(stream),
    };

    (headers, body).into_response()
}

/// Query parameters for `GET /api/tts/voices`
#[derive(Debug, Deserialize)]
pub struct VoicesQuery {
    #[serde(default)]
    pub engine: Option<String>,
}

/// Voices offered by one engine
#[derive(Debug, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub engine: EngineId,
    pub voices: Vec<VoiceDescriptor>,
}

/// List the voices of an engine
#[instrument(skip(state))]
pub async fn voices(
    State(state): State<AppState>,
    Query(query): Query<VoicesQuery>,
) -> Result<Json<VoicesResponse>, ApiError> {
    let requested = query.engine.unwrap_or_default();
    let engine = if requested.trim().is_empty() {
        state.gateway.default_engine()
    } else {
        requested.parse::<EngineId>()?
    };

    let voices = state.gateway.list_voices(engine.as_str()).await?;
    Ok(Json(VoicesResponse { engine, voices }))
}

/// Enabled engines with their limits
#[derive(Debug, Serialize, Deserialize)]
pub struct EnginesResponse {
    pub default_engine: EngineId,
    pub engines: Vec<EngineInfo>,
}

/// List the enabled engines
pub async fn engines(State(state): State<AppState>) -> Json<EnginesResponse> {
    Json(EnginesResponse {
        default_engine: state.gateway.default_engine(),
        engines: state.gateway.describe_engines(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speak_query_requires_text() {
        let query = SpeakQuery {
            text: None,
            engine: Some("google".to_string()),
            voice: None,
        };
        assert!(matches!(query.into_request(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn speak_query_defaults_engine() {
        let query = SpeakQuery {
            text: Some("Hello".to_string()),
            engine: None,
            voice: Some("en".to_string()),
        };
        let request = query.into_request().unwrap();
        assert_eq!(request.engine, "");
        assert_eq!(request.voice(), Some("en"));
    }

    #[test]
    fn buffered_response_headers() {
        let result = SynthesisResult::buffered(vec![1u8, 2, 3], speech_gateway::AudioFormat::Mp3);
        let response = audio_response(result);

        assert_eq!(response.headers()[CONTENT_TYPE], "audio/mpeg");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "inline; filename=\"speech.mp3\""
        );
    }
}
