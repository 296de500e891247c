//! Conversation assembly for the completion step

use serde::{Deserialize, Serialize};

use crate::persona::PersonaDefinition;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Build the conversation for one request
///
/// Always yields the persona system message, then every few-shot exchange as
/// a user/assistant pair in persona order, then exactly one user message
/// holding `transcript` unmodified.
#[must_use]
pub fn compose(persona: &PersonaDefinition, transcript: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(persona.few_shot_len() + 2);
    messages.push(Message::system(persona.system_prompt.as_str()));

    for example in &persona.examples {
        messages.push(Message::user(example.user.as_str()));
        messages.push(Message::assistant(example.assistant.as_str()));
    }

    messages.push(Message::user(transcript));
    messages
}
