// src/main.rs

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use larder::server::{bootstrap, parse_size, LarderConfig};
use larder::{run_server, ServerConfig, ServerState};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "larder")]
#[command(author, version, about = "Recipe catalogue HTTP service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        #[command(flatten)]
        settings: Settings,
    },
    /// Create the upload directory and an empty recipe document, then exit
    Init {
        #[command(flatten)]
        settings: Settings,
    },
}

/// Configuration sources shared by every command; flags override the file
#[derive(Args)]
struct Settings {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind to
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Recipe JSON document
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Directory for uploaded images
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Image size limit (e.g., "2MB")
    #[arg(long)]
    max_upload_size: Option<String>,
}

impl Settings {
    fn resolve(self) -> Result<ServerConfig> {
        let mut config = match self.config {
            Some(ref path) => {
                info!("Loading configuration from {}", path.display());
                LarderConfig::load(path)?.to_server_config()?
            }
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(data_file) = self.data_file {
            config.data_file = data_file;
        }
        if let Some(upload_dir) = self.upload_dir {
            config.upload_dir = upload_dir;
        }
        if let Some(ref size) = self.max_upload_size {
            config.max_upload_bytes = parse_size(size)?;
            if config.max_upload_bytes == 0 {
                anyhow::bail!("--max-upload-size must be greater than zero");
            }
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { settings } => run_server(settings.resolve()?).await,
        Commands::Init { settings } => {
            let config = settings.resolve()?;
            let state = ServerState::new(&config);
            bootstrap(&state).await?;
            println!("Upload directory: {}", config.upload_dir.display());
            println!("Recipe document: {}", config.data_file.display());
            Ok(())
        }
    }
}
