//! Voice endpoint: recorded audio in, persona reply out

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartError, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use bytes::Bytes;
use serde::Serialize;

use super::ApiState;
use crate::Error;
use crate::pipeline::VoiceReply;

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio_data";

const MISSING_AUDIO: &str = "No audio data provided.";

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/process_audio", post(process_audio))
        .with_state(state)
}

/// Transcribe, answer in persona and synthesize the answer
///
/// Expects a multipart body with the recording in `audio_data`.
async fn process_audio(
    State(state): State<Arc<ApiState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VoiceReply>, VoiceError> {
    let Ok(mut multipart) = multipart else {
        return Err(VoiceError::MissingInput(MISSING_AUDIO));
    };

    let audio = read_audio_field(&mut multipart)
        .await?
        .ok_or(VoiceError::MissingInput(MISSING_AUDIO))?;

    let reply = state.pipeline.process(&audio).await?;
    Ok(Json(reply))
}

/// Find the audio file part, skipping any other parts
///
/// Only a file upload counts; a plain form value named `audio_data` does not.
async fn read_audio_field(multipart: &mut Multipart) -> Result<Option<Bytes>, VoiceError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(AUDIO_FIELD) && field.file_name().is_some() {
            let audio = field.bytes().await?;
            tracing::debug!(audio_bytes = audio.len(), "received audio upload");
            return Ok(Some(audio));
        }
    }
    Ok(None)
}

/// Voice API errors
#[derive(Debug)]
pub enum VoiceError {
    /// Request lacked the audio field
    MissingInput(&'static str),
    /// Multipart body could not be read
    InvalidUpload(MultipartError),
    /// A pipeline stage failed
    Pipeline(Error),
}

impl From<MultipartError> for VoiceError {
    fn from(e: MultipartError) -> Self {
        Self::InvalidUpload(e)
    }
}

impl From<Error> for VoiceError {
    fn from(e: Error) -> Self {
        Self::Pipeline(e)
    }
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, error) = match self {
            Self::MissingInput(msg) => {
                tracing::warn!("request without audio");
                (StatusCode::BAD_REQUEST, msg.to_string())
            }
            Self::InvalidUpload(e) => {
                tracing::warn!(error = %e, "unreadable upload");
                (e.status(), e.body_text())
            }
            Self::Pipeline(e) => {
                // Clients get an opaque failure; the stage is only logged
                tracing::error!(stage = e.stage(), error = %e, "voice request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to process audio".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
