//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use persona_voice::api::ApiServerBuilder;
use persona_voice::voice::{Completer, Synthesizer, Transcriber};
use persona_voice::{Error, Exchange, Message, PersonaDefinition, Result, VoicePipeline};

pub const BOUNDARY: &str = "persona-voice-test-boundary";

/// Call counters shared between a test and its mock adapters
#[derive(Clone, Default)]
pub struct Calls {
    pub transcribe: Arc<AtomicUsize>,
    pub complete: Arc<AtomicUsize>,
    pub synthesize: Arc<AtomicUsize>,
    /// Conversation the completer last received
    pub conversation: Arc<Mutex<Vec<Message>>>,
    /// Audio the transcriber last received
    pub audio: Arc<Mutex<Vec<u8>>>,
}

impl Calls {
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.transcribe.load(Ordering::SeqCst),
            self.complete.load(Ordering::SeqCst),
            self.synthesize.load(Ordering::SeqCst),
        )
    }
}

pub struct MockTranscriber {
    pub calls: Calls,
    pub reply: Result<String>,
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        self.calls.transcribe.fetch_add(1, Ordering::SeqCst);
        *self.calls.audio.lock().unwrap() = audio.to_vec();
        clone_result(&self.reply)
    }
}

pub struct MockCompleter {
    pub calls: Calls,
    pub reply: Result<String>,
}

#[async_trait]
impl Completer for MockCompleter {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.calls.complete.fetch_add(1, Ordering::SeqCst);
        *self.calls.conversation.lock().unwrap() = messages.to_vec();
        clone_result(&self.reply)
    }
}

pub struct MockSynthesizer {
    pub calls: Calls,
    pub reply: Result<String>,
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<String> {
        self.calls.synthesize.fetch_add(1, Ordering::SeqCst);
        clone_result(&self.reply)
    }
}

fn clone_result(result: &Result<String>) -> Result<String> {
    match result {
        Ok(s) => Ok(s.clone()),
        Err(Error::Transcription(m)) => Err(Error::Transcription(m.clone())),
        Err(Error::Completion(m)) => Err(Error::Completion(m.clone())),
        Err(Error::Synthesis(m)) => Err(Error::Synthesis(m.clone())),
        Err(e) => Err(Error::Config(e.to_string())),
    }
}

/// Adapter outcomes for one test
pub struct Script {
    pub transcript: Result<String>,
    pub reply: Result<String>,
    pub audio: Result<String>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            transcript: Ok("What is your superpower?".to_string()),
            reply: Ok("Adaptability.".to_string()),
            audio: Ok("T2dn".to_string()),
        }
    }
}

/// Small persona with two exchanges
pub fn test_persona() -> PersonaDefinition {
    PersonaDefinition {
        id: "tester".to_string(),
        name: "Test Persona".to_string(),
        system_prompt: "You are a test persona.".to_string(),
        examples: vec![
            Exchange {
                user: "Who are you?".to_string(),
                assistant: "A test.".to_string(),
            },
            Exchange {
                user: "Why?".to_string(),
                assistant: "Coverage.".to_string(),
            },
        ],
    }
}

/// Build a pipeline over mock adapters
pub fn mock_pipeline(persona: PersonaDefinition, script: Script, calls: &Calls) -> VoicePipeline {
    VoicePipeline::new(
        Arc::new(persona),
        Box::new(MockTranscriber {
            calls: calls.clone(),
            reply: script.transcript,
        }),
        Box::new(MockCompleter {
            calls: calls.clone(),
            reply: script.reply,
        }),
        Box::new(MockSynthesizer {
            calls: calls.clone(),
            reply: script.audio,
        }),
    )
}

/// Build the full API router around a pipeline
pub fn build_router(pipeline: VoicePipeline) -> axum::Router {
    ApiServerBuilder::new(Arc::new(pipeline), 0).build().router()
}

/// Multipart body with a single file field
pub fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: audio/ogg\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart body to `/process_audio`
pub fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process_audio")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Read a response body as JSON
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
