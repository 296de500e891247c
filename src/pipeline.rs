//! Request pipeline: audio in, transcript, reply and speech out
//!
//! Stages run strictly in sequence on the calling task. Any failure ends the
//! request; nothing from earlier stages needs undoing since no stage mutates
//! shared state.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::persona::PersonaDefinition;
use crate::prompt::compose;
use crate::voice::{
    Completer, ElevenLabsSpeech, GroqChat, GroqWhisper, Synthesizer, Transcriber,
};
use crate::Result;

/// Everything returned to the caller for one utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceReply {
    pub transcript: String,
    pub response_text: String,
    pub audio_base64: String,
}

/// Sequences the adapters behind one persona
pub struct VoicePipeline {
    persona: Arc<PersonaDefinition>,
    transcriber: Box<dyn Transcriber>,
    completer: Box<dyn Completer>,
    synthesizer: Box<dyn Synthesizer>,
}

impl VoicePipeline {
    /// Create a pipeline from explicit adapters
    #[must_use]
    pub fn new(
        persona: Arc<PersonaDefinition>,
        transcriber: Box<dyn Transcriber>,
        completer: Box<dyn Completer>,
        synthesizer: Box<dyn Synthesizer>,
    ) -> Self {
        Self {
            persona,
            transcriber,
            completer,
            synthesizer,
        }
    }

    /// Create a pipeline backed by Groq and `ElevenLabs`
    #[must_use]
    pub fn from_config(config: &Config, persona: Arc<PersonaDefinition>) -> Self {
        let groq_key = config.api_keys.groq.clone().unwrap_or_default();
        let elevenlabs_key = config.api_keys.elevenlabs.clone().unwrap_or_default();

        Self::new(
            persona,
            Box::new(GroqWhisper::new(groq_key.clone(), &config.stt)),
            Box::new(GroqChat::new(groq_key, &config.llm)),
            Box::new(ElevenLabsSpeech::new(elevenlabs_key, &config.tts)),
        )
    }

    /// Persona every conversation is conditioned on
    #[must_use]
    pub fn persona(&self) -> &PersonaDefinition {
        &self.persona
    }

    /// Run one utterance through transcription, completion and synthesis
    ///
    /// # Errors
    ///
    /// Returns the first adapter error; later stages are not attempted
    pub async fn process(&self, audio: &[u8]) -> Result<VoiceReply> {
        tracing::debug!(audio_bytes = audio.len(), "processing utterance");

        let transcript = self.transcriber.transcribe(audio).await?;
        tracing::info!(transcript = %transcript, "transcribed");

        let messages = compose(&self.persona, &transcript);
        tracing::debug!(messages = messages.len(), "composed conversation");

        let response_text = self.completer.complete(&messages).await?;
        tracing::info!(response = %response_text, "completed");

        let audio_base64 = self.synthesizer.synthesize(&response_text).await?;
        tracing::debug!(encoded_len = audio_base64.len(), "synthesized");

        Ok(VoiceReply {
            transcript,
            response_text,
            audio_base64,
        })
    }
}
