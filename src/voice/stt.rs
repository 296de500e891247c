//! Speech-to-text (STT) processing

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tempfile::NamedTempFile;

use crate::config::SttConfig;
use crate::{Error, Result};

/// Container the uploaded audio is staged as
pub const STAGING_SUFFIX: &str = ".ogg";
const STAGING_MIME: &str = "audio/ogg";

/// Converts recorded audio into a transcript
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio to text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transcription`] if the payload is empty or the
    /// upstream service rejects it or cannot be reached
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Response from the Groq transcription API
///
/// `verbose_json` also carries segments and timing, only the text is used.
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes speech with Whisper hosted on Groq
pub struct GroqWhisper {
    client: reqwest::Client,
    api_key: String,
    url: String,
    model: String,
    response_format: String,
    staging_dir: PathBuf,
}

impl GroqWhisper {
    /// Create a new Groq Whisper transcriber
    ///
    /// An empty key is accepted; the upstream call will fail authentication.
    #[must_use]
    pub fn new(api_key: String, config: &SttConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            url: format!(
                "{}/openai/v1/audio/transcriptions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
            response_format: config.response_format.clone(),
            staging_dir: config
                .staging_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
        }
    }

    /// Directory where uploads are staged
    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Write the payload to a temp file that is deleted when dropped
    async fn stage(&self, audio: &[u8]) -> Result<NamedTempFile> {
        let staged = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.staging_dir)
            .map_err(|e| Error::Transcription(format!("failed to stage audio: {e}")))?;

        tokio::fs::write(staged.path(), audio)
            .await
            .map_err(|e| Error::Transcription(format!("failed to stage audio: {e}")))?;

        tracing::debug!(path = %staged.path().display(), "staged audio");
        Ok(staged)
    }

    async fn upload(&self, staged: &NamedTempFile) -> Result<String> {
        let audio = tokio::fs::read(staged.path())
            .await
            .map_err(|e| Error::Transcription(format!("failed to read staged audio: {e}")))?;

        let file_name = staged
            .path()
            .file_name()
            .map_or_else(|| format!("audio{STAGING_SUFFIX}"), |n| n.to_string_lossy().into_owned());

        let part = Part::bytes(audio)
            .file_name(file_name)
            .mime_str(STAGING_MIME)
            .map_err(|e| Error::Transcription(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", self.response_format.clone());

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                Error::Transcription(format!("request failed: {e}"))
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Transcription(format!("Whisper API error {status}: {body}")));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            Error::Transcription(format!("invalid response: {e}"))
        })?;

        Ok(result.text)
    }
}

#[async_trait]
impl Transcriber for GroqWhisper {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        if audio.is_empty() {
            return Err(Error::Transcription("empty audio payload".to_string()));
        }

        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        // Dropping `staged` removes the file on every return path
        let staged = self.stage(audio).await?;
        let text = self.upload(&staged).await?;

        tracing::debug!(transcript_chars = text.chars().count(), "transcription complete");
        Ok(text)
    }
}
