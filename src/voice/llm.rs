//! Streamed chat completion

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::stream::{collect_text, sse_data};
use crate::config::LlmConfig;
use crate::prompt::Message;
use crate::{Error, Result};

/// Produces the persona's reply to a conversation
#[async_trait]
pub trait Completer: Send + Sync {
    /// Generate a reply for the conversation
    ///
    /// # Errors
    ///
    /// Returns [`Error::Completion`] if the service is unavailable or the
    /// stream is malformed
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    top_p: f32,
    max_completion_tokens: u32,
    stream: bool,
    stop: Option<&'a str>,
}

/// One `chat.completion.chunk` event
#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    message: String,
}

/// Extract the text fragment carried by one event payload
fn parse_fragment(data: &str) -> Result<Option<String>> {
    let chunk: ChatChunk = serde_json::from_str(data).map_err(|e| {
        tracing::warn!(
            error = %e,
            data = %data.chars().take(200).collect::<String>(),
            "malformed completion chunk"
        );
        Error::Completion(format!("malformed stream chunk: {e}"))
    })?;

    if let Some(error) = chunk.error {
        return Err(Error::Completion(format!("stream error: {}", error.message)));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content))
}

/// Map an event stream's payloads to text fragments
pub fn fragments<S, E>(bytes: S) -> impl Stream<Item = Result<Option<String>>>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    sse_data(bytes).map(|data| match data {
        Ok(data) => parse_fragment(&data),
        Err(e) => Err(Error::Completion(format!("stream interrupted: {e}"))),
    })
}

/// Chat completion against Groq's OpenAI-compatible endpoint
pub struct GroqChat {
    client: reqwest::Client,
    api_key: String,
    url: String,
    model: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

impl GroqChat {
    /// Create a new Groq chat client
    ///
    /// An empty key is accepted; the upstream call will fail authentication.
    #[must_use]
    pub fn new(api_key: String, config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            url: format!(
                "{}/openai/v1/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl Completer for GroqChat {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        tracing::debug!(model = %self.model, messages = messages.len(), "starting completion");

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            top_p: self.top_p,
            max_completion_tokens: self.max_tokens,
            stream: true,
            stop: None,
        };

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "completion request failed");
                Error::Completion(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "completion API error");
            return Err(Error::Completion(format!("Groq API error {status}: {body}")));
        }

        let reply = collect_text(fragments(Box::pin(response.bytes_stream()))).await?;

        tracing::debug!(reply_chars = reply.chars().count(), "completion complete");
        Ok(reply)
    }
}
