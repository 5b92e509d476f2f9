// src/server/mod.rs
//! Larder HTTP server
//!
//! Serves the recipe API:
//! - List, fetch, search, create, replace, patch and delete recipes
//! - Accepts one image upload per create/update request
//! - Persists the whole collection to a single JSON document per mutation
//!
//! There is no cross-request coordination. Handlers share the state under a
//! read lock only, so overlapping mutations race and the last save wins.

pub mod config;
mod error;
mod form;
mod handlers;
mod routes;
pub mod uploads;

pub use config::{parse_size, LarderConfig};
pub use error::{ApiError, MessageBody};
pub use routes::create_router;
pub use uploads::{ImageStore, ImageUpload, UploadError};

use crate::store::{JsonFileStore, RecipeStore};
use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Path to the recipe JSON document
    pub data_file: PathBuf,
    /// Directory uploaded images are written to
    pub upload_dir: PathBuf,
    /// Accepted image extensions, compared case-insensitively
    pub allowed_extensions: Vec<String>,
    /// Largest accepted image in bytes (default 2MB)
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            data_file: PathBuf::from("app/static/data.json"),
            upload_dir: PathBuf::from("app/static/images"),
            allowed_extensions: ["png", "jpg", "jpeg", "gif"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_upload_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Shared server state
pub struct ServerState {
    /// Recipe collection storage
    pub store: Arc<dyn RecipeStore>,
    /// Image validation and storage
    pub images: ImageStore,
}

impl ServerState {
    /// State backed by the JSON document named in `config`
    pub fn new(config: &ServerConfig) -> Self {
        let store = Arc::new(JsonFileStore::new(config.data_file.clone()));
        Self::with_store(config, store)
    }

    /// State backed by a caller-provided store
    pub fn with_store(config: &ServerConfig, store: Arc<dyn RecipeStore>) -> Self {
        let images = ImageStore::new(
            config.upload_dir.clone(),
            config.allowed_extensions.clone(),
            config.max_upload_bytes,
        );
        Self { store, images }
    }
}

/// Create the upload directory and an empty recipe document if missing
pub async fn bootstrap(state: &ServerState) -> Result<()> {
    tokio::fs::create_dir_all(state.images.dir())
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory: {}",
                state.images.dir().display()
            )
        })?;

    state
        .store
        .init()
        .await
        .with_context(|| format!("Failed to initialize {}", state.store.location()))?;

    Ok(())
}

/// Start the recipe server
pub async fn run_server(config: ServerConfig) -> Result<()> {
    tracing::info!("Starting Larder on {}", config.bind_addr());
    tracing::info!("Recipe data: {:?}", config.data_file);
    tracing::info!("Upload directory: {:?}", config.upload_dir);
    tracing::info!(
        "Accepting {} up to {} bytes",
        config.allowed_extensions.join(", "),
        config.max_upload_bytes
    );

    let state = ServerState::new(&config);
    bootstrap(&state).await?;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    tracing::info!("Larder is ready to serve");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
