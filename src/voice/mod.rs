//! Voice processing module
//!
//! Adapters for the three upstream services a voice request passes through:
//! transcription, chat completion and speech synthesis. Each one drains its
//! upstream response completely before returning.

mod llm;
pub mod stream;
mod stt;
mod tts;

pub use llm::{Completer, GroqChat, fragments};
pub use stream::{AudioFragment, collect_audio, collect_text, encode_audio};
pub use stt::{GroqWhisper, STAGING_SUFFIX, Transcriber};
pub use tts::{ElevenLabsSpeech, Synthesizer, audio_fragments};
