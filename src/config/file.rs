//! TOML configuration file loading
//!
//! Supports `~/.config/persona-voice/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "PERSONA_VOICE_CONFIG";

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Persona id or path to a persona JSON file
    #[serde(default)]
    pub persona: Option<String>,

    /// Speech-to-text settings
    #[serde(default)]
    pub stt: SttFileConfig,

    /// Chat completion settings
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Text-to-speech settings
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerFileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct SttFileConfig {
    /// Transcription model (e.g. "whisper-large-v3-turbo")
    pub model: Option<String>,

    /// Transcription response format (e.g. "verbose_json")
    pub response_format: Option<String>,

    /// Directory used to stage uploaded audio
    pub staging_dir: Option<String>,

    /// Groq API base URL
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "llama-3.3-70b-specdec")
    pub model: Option<String>,

    pub temperature: Option<f32>,

    pub top_p: Option<f32>,

    /// Completion token cap
    pub max_tokens: Option<u32>,

    /// Groq API base URL
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// ElevenLabs voice id
    pub voice_id: Option<String>,

    /// ElevenLabs model id (e.g. "eleven_multilingual_v2")
    pub model: Option<String>,

    /// ElevenLabs output format (e.g. "mp3_44100_128")
    pub output_format: Option<String>,

    /// ElevenLabs API base URL
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub groq: Option<String>,
    pub elevenlabs: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port to listen on
    pub port: Option<u16>,

    /// Directory holding the web client
    pub static_dir: Option<String>,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: Option<usize>,
}

/// Parse a TOML config document
///
/// # Errors
///
/// Returns error if the document is not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path
///
/// `PERSONA_VOICE_CONFIG` wins; otherwise `~/.config/persona-voice/config.toml`.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    directories::BaseDirs::new().map(|d| d.config_dir().join("persona-voice").join("config.toml"))
}
