//! Health check and status endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Persona info for API responses
#[derive(Serialize)]
pub struct PersonaInfo {
    pub id: String,
    pub name: String,
    /// Number of few-shot exchanges preceding every question
    pub examples: usize,
    /// MIME type of `audio_base64` in voice replies
    pub audio_mime: &'static str,
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Get the persona answering questions
async fn get_persona(State(state): State<Arc<ApiState>>) -> Json<PersonaInfo> {
    let persona = state.pipeline.persona();
    Json(PersonaInfo {
        id: persona.id.clone(),
        name: persona.name.clone(),
        examples: persona.examples.len(),
        audio_mime: state.audio_mime,
    })
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Build status router (needs state)
pub fn status_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/persona", get(get_persona))
        .with_state(state)
}
