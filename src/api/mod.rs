//! HTTP API server for the persona voice endpoint

pub mod health;
pub mod voice;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::pipeline::VoicePipeline;
use crate::Result;

const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Shared state for API handlers
///
/// Read-only after construction; requests share nothing mutable.
pub struct ApiState {
    pub pipeline: Arc<VoicePipeline>,
    /// MIME type of the synthesized reply audio
    pub audio_mime: &'static str,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    pipeline: Arc<VoicePipeline>,
    port: u16,
    static_dir: Option<PathBuf>,
    max_upload_bytes: usize,
    audio_mime: &'static str,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(pipeline: Arc<VoicePipeline>, port: u16) -> Self {
        Self {
            pipeline,
            port,
            static_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            audio_mime: DEFAULT_AUDIO_MIME,
        }
    }

    /// Set the static files directory for serving the web client
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Set the maximum accepted request body size
    #[must_use]
    pub const fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Set the MIME type clients should play replies as
    #[must_use]
    pub const fn audio_mime(mut self, mime: &'static str) -> Self {
        self.audio_mime = mime;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(ApiState {
                pipeline: self.pipeline,
                audio_mime: self.audio_mime,
            }),
            port: self.port,
            static_dir: self.static_dir,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
    max_upload_bytes: usize,
}

impl ApiServer {
    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(voice::router(self.state.clone()))
            .merge(health::router())
            .merge(health::status_router(self.state.clone()));

        // Serve the web client if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router
            .layer(DefaultBodyLimit::max(self.max_upload_bytes))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
