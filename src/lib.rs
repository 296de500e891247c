//! Persona Voice - spoken questions answered in a fixed persona
//!
//! One request flows through three upstream services in sequence:
//!
//! ```text
//! audio ──▶ Transcriber ──▶ compose(persona) ──▶ Completer ──▶ Synthesizer ──▶ JSON
//!           (Groq Whisper)                       (Groq chat)    (ElevenLabs)
//! ```
//!
//! The persona (system prompt plus few-shot exchanges) is loaded once at
//! startup and shared read-only by every request.

pub mod api;
pub mod config;
pub mod error;
pub mod persona;
pub mod pipeline;
pub mod prompt;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use persona::{Exchange, PersonaDefinition};
pub use pipeline::{VoicePipeline, VoiceReply};
pub use prompt::{Message, Role, compose};
