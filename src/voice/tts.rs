//! Text-to-speech (TTS) processing

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use super::stream::{AudioFragment, collect_audio, encode_audio};
use crate::config::TtsConfig;
use crate::{Error, Result};

/// Turns reply text into transport-encoded speech
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text and return the audio as base64
    ///
    /// Empty text yields an empty encoding rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] if the service is unavailable or the
    /// stream fails
    async fn synthesize(&self, text: &str) -> Result<String>;
}

/// Classify transport chunks; zero-length frames carry no audio
pub fn audio_fragments<S, E>(bytes: S) -> impl Stream<Item = Result<AudioFragment>>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>>,
    E: std::fmt::Display,
{
    bytes.map(|chunk| match chunk {
        Ok(chunk) if chunk.is_empty() => Ok(AudioFragment::Control),
        Ok(chunk) => Ok(AudioFragment::Audio(chunk)),
        Err(e) => Err(Error::Synthesis(format!("stream interrupted: {e}"))),
    })
}

/// Synthesizes speech with the `ElevenLabs` streaming endpoint
pub struct ElevenLabsSpeech {
    client: reqwest::Client,
    api_key: String,
    url: String,
    model: String,
    output_format: String,
}

impl ElevenLabsSpeech {
    /// Create a new `ElevenLabs` synthesizer
    ///
    /// An empty key is accepted; the upstream call will fail authentication.
    #[must_use]
    pub fn new(api_key: String, config: &TtsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            url: format!(
                "{}/v1/text-to-speech/{}/stream",
                config.base_url.trim_end_matches('/'),
                config.voice_id
            ),
            model: config.model.clone(),
            output_format: config.output_format.clone(),
        }
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsSpeech {
    async fn synthesize(&self, text: &str) -> Result<String> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        if text.is_empty() {
            tracing::debug!("empty text, skipping synthesis");
            return Ok(encode_audio(&[]));
        }

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&self.url)
            .query(&[("output_format", self.output_format.as_str())])
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "ElevenLabs request failed");
                Error::Synthesis(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "ElevenLabs TTS error");
            return Err(Error::Synthesis(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = collect_audio(audio_fragments(response.bytes_stream())).await?;

        tracing::info!(audio_bytes = audio.len(), "synthesis complete");
        Ok(encode_audio(&audio))
    }
}
