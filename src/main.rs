use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use persona_voice::api::ApiServerBuilder;
use persona_voice::{Config, PersonaDefinition, VoicePipeline};

/// Persona Voice - answers spoken questions in a fixed persona
#[derive(Parser)]
#[command(name = "persona-voice", version, about)]
struct Cli {
    /// Persona to use: an embedded id (e.g. "aarya") or a path to a persona JSON file
    #[arg(short, long, env = "PERSONA_VOICE_PERSONA")]
    persona: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PERSONA_VOICE_PORT")]
    port: Option<u16>,

    /// Directory holding the web client
    #[arg(long, env = "PERSONA_VOICE_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the resolved configuration and report missing credentials
    Check,
    /// Run a recorded audio file through the pipeline and print the reply JSON
    Process {
        /// Path to the recording
        path: PathBuf,
    },
    /// List embedded personas
    Personas,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Credentials may live in a local .env file
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,persona_voice=info",
        1 => "info,persona_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load();
    if let Some(persona) = cli.persona {
        config.persona = persona;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.static_dir.is_some() {
        config.server.static_dir = cli.static_dir;
    }
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Check => check(&config),
            Command::Process { path } => process_file(&config, &path).await,
            Command::Personas => {
                for id in PersonaDefinition::embedded_ids() {
                    println!("{id}");
                }
                Ok(())
            }
        };
    }

    let persona = Arc::new(PersonaDefinition::load(&config.persona)?);
    tracing::info!(
        persona = %persona.id,
        examples = persona.examples.len(),
        port = config.server.port,
        "starting persona voice"
    );

    // Credentials are not required to start; the upstream call fails instead
    for key in config.api_keys.missing() {
        tracing::warn!(key, "credential not set, requests using it will fail");
    }

    let pipeline = Arc::new(VoicePipeline::from_config(&config, persona));
    let server = ApiServerBuilder::new(pipeline, config.server.port)
        .static_dir(config.server.static_dir.clone())
        .max_upload_bytes(config.server.max_upload_bytes)
        .audio_mime(config.tts.audio_mime())
        .build();

    server.run().await?;
    Ok(())
}

/// Print the resolved configuration, failing if a credential is missing
fn check(config: &Config) -> anyhow::Result<()> {
    let persona = PersonaDefinition::load(&config.persona)?;

    println!("persona:      {} ({})", persona.name, persona.id);
    println!("examples:     {}", persona.examples.len());
    println!("stt:          {} @ {}", config.stt.model, config.stt.base_url);
    println!(
        "llm:          {} @ {} (temperature {}, top_p {}, max_tokens {})",
        config.llm.model,
        config.llm.base_url,
        config.llm.temperature,
        config.llm.top_p,
        config.llm.max_tokens
    );
    println!(
        "tts:          {} voice {} ({}) @ {}",
        config.tts.model, config.tts.voice_id, config.tts.output_format, config.tts.base_url
    );
    println!("port:         {}", config.server.port);
    println!("api keys:     {:?}", config.api_keys);

    let missing = config.api_keys.missing();
    if missing.is_empty() {
        println!("\nall credentials present");
        Ok(())
    } else {
        anyhow::bail!("missing credentials: {}", missing.join(", "))
    }
}

/// Run a local recording through the pipeline
async fn process_file(config: &Config, path: &std::path::Path) -> anyhow::Result<()> {
    let persona = Arc::new(PersonaDefinition::load(&config.persona)?);
    let audio = tokio::fs::read(path).await?;

    let pipeline = VoicePipeline::from_config(config, persona);
    let reply = pipeline.process(&audio).await?;

    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}
