//! Configuration management for the persona voice endpoint
//!
//! Values resolve as env > TOML file > default. Credentials are read once at
//! startup and are not validated here; a missing key surfaces when the
//! corresponding upstream call fails authentication.

pub mod file;

use std::fmt;
use std::path::PathBuf;

use crate::persona::DEFAULT_PERSONA_ID;

use self::file::ConfigFile;

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com";
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";

pub const DEFAULT_STT_MODEL: &str = "whisper-large-v3-turbo";
pub const DEFAULT_STT_RESPONSE_FORMAT: &str = "verbose_json";

pub const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-specdec";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 1.0;
pub const DEFAULT_MAX_TOKENS: u32 = 150;

pub const DEFAULT_TTS_VOICE: &str = "JBFqnCBsd6RMkjVDRZzb";
pub const DEFAULT_TTS_MODEL: &str = "eleven_multilingual_v2";
pub const DEFAULT_TTS_FORMAT: &str = "mp3_44100_128";

pub const DEFAULT_PORT: u16 = 5000;

/// Web client directory used when present and nothing else is configured
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Groq's upload ceiling for transcription requests
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Persona voice configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Persona id or path to a persona JSON file
    pub persona: String,

    /// API keys
    pub api_keys: ApiKeys,

    /// Speech-to-text configuration
    pub stt: SttConfig,

    /// Chat completion configuration
    pub llm: LlmConfig,

    /// Text-to-speech configuration
    pub tts: TtsConfig,

    /// HTTP server configuration
    pub server: ServerConfig,
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// Groq key (transcription and chat completion)
    pub groq: Option<String>,

    /// `ElevenLabs` key (speech synthesis)
    pub elevenlabs: Option<String>,
}

impl ApiKeys {
    /// Names of the environment variables whose keys are absent
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.groq.as_deref().is_none_or(str::is_empty) {
            missing.push("GROQ_API_KEY");
        }
        if self.elevenlabs.as_deref().is_none_or(str::is_empty) {
            missing.push("ELEVEN_LABS_API_KEY");
        }
        missing
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("groq", &redact(&self.groq))
            .field("elevenlabs", &redact(&self.elevenlabs))
            .finish()
    }
}

/// Transcription configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    pub base_url: String,
    pub model: String,
    pub response_format: String,
    /// Where uploaded audio is staged; the system temp dir when unset
    pub staging_dir: Option<PathBuf>,
}

/// Chat completion configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub base_url: String,
    pub voice_id: String,
    pub model: String,
    pub output_format: String,
}

impl TtsConfig {
    /// MIME type of audio produced with the configured output format
    ///
    /// `ElevenLabs` formats are named `<codec>_<rate>[_<bitrate>]`.
    #[must_use]
    pub fn audio_mime(&self) -> &'static str {
        match self.output_format.split('_').next() {
            Some("pcm") => "audio/pcm",
            Some("ulaw") => "audio/basic",
            Some("alaw") => "audio/x-alaw-basic",
            Some("opus") => "audio/ogg",
            _ => "audio/mpeg",
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Directory holding the web client (`index.html`, `script.js`)
    pub static_dir: Option<PathBuf>,

    /// Maximum accepted request body size
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_sources(ConfigFile::default(), |_| None)
    }
}

impl Config {
    /// Load configuration from the environment and the TOML config file
    #[must_use]
    pub fn load() -> Self {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// Empty environment values count as unset.
    #[must_use]
    pub fn from_sources<F>(fc: ConfigFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.is_empty());

        let groq_base = var("GROQ_BASE_URL");

        let api_keys = ApiKeys {
            groq: var("GROQ_API_KEY").or(fc.api_keys.groq),
            elevenlabs: var("ELEVEN_LABS_API_KEY")
                .or_else(|| var("ELEVENLABS_API_KEY"))
                .or(fc.api_keys.elevenlabs),
        };

        let stt = SttConfig {
            base_url: groq_base
                .clone()
                .or(fc.stt.base_url)
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            model: var("PERSONA_VOICE_STT_MODEL")
                .or(fc.stt.model)
                .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            response_format: fc
                .stt
                .response_format
                .unwrap_or_else(|| DEFAULT_STT_RESPONSE_FORMAT.to_string()),
            staging_dir: var("PERSONA_VOICE_STAGING_DIR")
                .or(fc.stt.staging_dir)
                .map(PathBuf::from),
        };

        let llm = LlmConfig {
            base_url: groq_base
                .or(fc.llm.base_url)
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            model: var("PERSONA_VOICE_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature: fc.llm.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_p: fc.llm.top_p.unwrap_or(DEFAULT_TOP_P),
            max_tokens: fc.llm.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };

        let tts = TtsConfig {
            base_url: var("ELEVEN_LABS_BASE_URL")
                .or(fc.tts.base_url)
                .unwrap_or_else(|| DEFAULT_ELEVENLABS_BASE_URL.to_string()),
            voice_id: var("PERSONA_VOICE_TTS_VOICE")
                .or(fc.tts.voice_id)
                .unwrap_or_else(|| DEFAULT_TTS_VOICE.to_string()),
            model: var("PERSONA_VOICE_TTS_MODEL")
                .or(fc.tts.model)
                .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            output_format: var("PERSONA_VOICE_TTS_FORMAT")
                .or(fc.tts.output_format)
                .unwrap_or_else(|| DEFAULT_TTS_FORMAT.to_string()),
        };

        let server = ServerConfig {
            port: var("PERSONA_VOICE_PORT")
                .or_else(|| var("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: var("PERSONA_VOICE_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from)
                .or_else(|| {
                    let dir = PathBuf::from(DEFAULT_STATIC_DIR);
                    dir.is_dir().then_some(dir)
                }),
            max_upload_bytes: fc
                .server
                .max_upload_bytes
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        };

        Self {
            persona: var("PERSONA_VOICE_PERSONA")
                .or(fc.persona)
                .unwrap_or_else(|| DEFAULT_PERSONA_ID.to_string()),
            api_keys,
            stt,
            llm,
            tts,
            server,
        }
    }
}
