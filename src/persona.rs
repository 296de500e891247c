//! Persona definitions
//!
//! A persona is the fixed system prompt plus the ordered few-shot exchanges
//! that condition every completion. It is loaded once at startup and shared
//! read-only across requests.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifier of the persona used when none is configured
pub const DEFAULT_PERSONA_ID: &str = "aarya";

/// Personas compiled into the binary
const EMBEDDED_PERSONAS: &[(&str, &str)] =
    &[("aarya", include_str!("../personas/aarya.json"))];

/// Fixed persona: system instructions and example exchanges
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaDefinition {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// System prompt sent as the first message of every conversation
    pub system_prompt: String,

    /// Few-shot exchanges, sent in this order after the system prompt
    #[serde(default)]
    pub examples: Vec<Exchange>,
}

/// One example question and the answer the persona would give
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

impl PersonaDefinition {
    /// Parse and validate a persona JSON document
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or the persona is incomplete
    pub fn from_json(json: &str) -> Result<Self> {
        let persona: Self = serde_json::from_str(json)?;
        persona.validate()?;
        Ok(persona)
    }

    /// Load a persona compiled into the binary
    ///
    /// # Errors
    ///
    /// Returns error if no embedded persona has the given id
    pub fn embedded(id: &str) -> Result<Self> {
        let (_, json) = EMBEDDED_PERSONAS
            .iter()
            .find(|(embedded_id, _)| *embedded_id == id)
            .ok_or_else(|| Error::Persona(format!("no embedded persona named {id:?}")))?;

        Self::from_json(json)
    }

    /// Load a persona by embedded id or from a JSON file path
    ///
    /// References ending in `.json` or naming an existing file are read from
    /// disk; anything else is looked up among the embedded personas.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or the persona is invalid
    pub fn load(reference: &str) -> Result<Self> {
        let path = Path::new(reference);
        if reference.ends_with(".json") || path.is_file() {
            tracing::debug!(path = %path.display(), "loading persona from file");
            let content = std::fs::read_to_string(path)?;
            return Self::from_json(&content);
        }

        Self::embedded(reference)
    }

    /// Ids of all personas compiled into the binary
    #[must_use]
    pub fn embedded_ids() -> Vec<&'static str> {
        EMBEDDED_PERSONAS.iter().map(|(id, _)| *id).collect()
    }

    /// Number of few-shot messages (two per exchange)
    #[must_use]
    pub fn few_shot_len(&self) -> usize {
        self.examples.len() * 2
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Persona("persona id is empty".to_string()));
        }
        if self.system_prompt.trim().is_empty() {
            return Err(Error::Persona(format!(
                "persona {:?} has an empty system prompt",
                self.id
            )));
        }
        if let Some(index) = self
            .examples
            .iter()
            .position(|e| e.user.is_empty() || e.assistant.is_empty())
        {
            return Err(Error::Persona(format!(
                "persona {:?} example {index} is missing a user or assistant turn",
                self.id
            )));
        }
        Ok(())
    }
}
