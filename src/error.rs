//! Error types for the persona voice endpoint

use thiserror::Error;

/// Result type alias for persona voice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a voice request
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Persona definition could not be loaded or is invalid
    #[error("persona error: {0}")]
    Persona(String),

    /// Speech-to-text error
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Chat completion error
    #[error("completion error: {0}")]
    Completion(String),

    /// Text-to-speech error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Pipeline stage that produced the error, for logging
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Transcription(_) => "transcription",
            Self::Completion(_) => "completion",
            Self::Synthesis(_) => "synthesis",
            Self::Config(_) | Self::Persona(_) => "setup",
            Self::Io(_) | Self::Serialization(_) | Self::Toml(_) => "internal",
        }
    }
}
