// src/server/config.rs
//! Configuration file parsing for the Larder server
//!
//! Supports TOML configuration files with the following sections:
//! - [server] - Bind host and port
//! - [storage] - Recipe document location
//! - [uploads] - Image directory, extension allow-list, size limit
//!
//! Every section and key is optional; missing values take the defaults of
//! [`ServerConfig`].

use crate::server::ServerConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LarderConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerSection,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageSection,

    /// Upload settings
    #[serde(default)]
    pub uploads: UploadsSection,
}

/// Server configuration section
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    ServerConfig::default().host.to_string()
}

fn default_port() -> u16 {
    ServerConfig::default().port
}

/// Storage configuration section
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    /// Recipe JSON document
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

fn default_data_file() -> PathBuf {
    ServerConfig::default().data_file
}

/// Upload configuration section
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadsSection {
    /// Directory uploaded images are written to
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Accepted extensions without the leading dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Size limit in bytes
    #[serde(default)]
    pub max_upload_bytes: Option<u64>,

    /// Size limit as a human-readable string (e.g., "2MB", "512KB")
    #[serde(default)]
    pub max_upload_size: Option<String>,
}

impl Default for UploadsSection {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            allowed_extensions: default_allowed_extensions(),
            max_upload_bytes: None,
            max_upload_size: None,
        }
    }
}

fn default_upload_dir() -> PathBuf {
    ServerConfig::default().upload_dir
}

fn default_allowed_extensions() -> Vec<String> {
    ServerConfig::default().allowed_extensions
}

impl LarderConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: LarderConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("Invalid server.host address: {}", self.server.host))?;

        if self.uploads.allowed_extensions.is_empty() {
            anyhow::bail!("uploads.allowed_extensions must not be empty");
        }
        for ext in &self.uploads.allowed_extensions {
            if ext.is_empty() || ext.contains('.') {
                anyhow::bail!(
                    "uploads.allowed_extensions entries must be bare extensions, got '{}'",
                    ext
                );
            }
        }

        if self.uploads.max_upload_bytes.is_some() && self.uploads.max_upload_size.is_some() {
            anyhow::bail!("set only one of uploads.max_upload_bytes and uploads.max_upload_size");
        }
        if self.max_upload_bytes()? == 0 {
            anyhow::bail!("upload size limit must be greater than zero");
        }

        Ok(())
    }

    /// Effective upload limit in bytes
    pub fn max_upload_bytes(&self) -> Result<u64> {
        if let Some(bytes) = self.uploads.max_upload_bytes {
            return Ok(bytes);
        }
        match self.uploads.max_upload_size {
            Some(ref size) => parse_size(size),
            None => Ok(ServerConfig::default().max_upload_bytes),
        }
    }

    /// Convert to the internal ServerConfig structure
    pub fn to_server_config(&self) -> Result<ServerConfig> {
        let host = self
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid server.host address: {}", self.server.host))?;

        Ok(ServerConfig {
            host,
            port: self.server.port,
            data_file: self.storage.data_file.clone(),
            upload_dir: self.uploads.upload_dir.clone(),
            allowed_extensions: self
                .uploads
                .allowed_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            max_upload_bytes: self.max_upload_bytes()?,
        })
    }
}

/// Parse a human-readable size string (e.g., "2MB", "512KB", "1GB")
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("GB") {
        (n, 1024u64 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024u64 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024u64)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1u64)
    } else {
        // Assume bytes
        (s.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid size number: {}", num_str))?;
    if num < 0.0 {
        anyhow::bail!("Size must not be negative: {}", s);
    }

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("2MB").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size(" 2mb ").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1GB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("1.5MB").unwrap(), (1.5 * 1024.0 * 1024.0) as u64);
        assert!(parse_size("lots").is_err());
        assert!(parse_size("-1MB").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = LarderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.to_server_config().unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[server]
host = "127.0.0.1"
port = 8080

[storage]
data_file = "/srv/larder/data.json"

[uploads]
upload_dir = "/srv/larder/images"
allowed_extensions = ["PNG", "webp"]
max_upload_size = "512KB"
"#;
        let config: LarderConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());

        let server = config.to_server_config().unwrap();
        assert_eq!(server.bind_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(server.data_file, PathBuf::from("/srv/larder/data.json"));
        assert_eq!(server.upload_dir, PathBuf::from("/srv/larder/images"));
        assert_eq!(server.allowed_extensions, vec!["png", "webp"]);
        assert_eq!(server.max_upload_bytes, 512 * 1024);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: LarderConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        let server = config.to_server_config().unwrap();
        assert_eq!(server.port, 9000);
        assert_eq!(server.upload_dir, ServerConfig::default().upload_dir);
        assert_eq!(server.max_upload_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_max_upload_bytes_key() {
        let config: LarderConfig =
            toml::from_str("[uploads]\nmax_upload_bytes = 1000\n").unwrap();
        assert_eq!(config.max_upload_bytes().unwrap(), 1000);
    }

    #[test]
    fn test_invalid_host() {
        let config: LarderConfig = toml::from_str("[server]\nhost = \"nowhere\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_extensions() {
        let config: LarderConfig =
            toml::from_str("[uploads]\nallowed_extensions = []\n").unwrap();
        assert!(config.validate().is_err());

        let config: LarderConfig =
            toml::from_str("[uploads]\nallowed_extensions = [\".png\"]\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_conflicting_size_keys() {
        let config: LarderConfig = toml::from_str(
            "[uploads]\nmax_upload_bytes = 10\nmax_upload_size = \"1MB\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config: LarderConfig =
            toml::from_str("[uploads]\nmax_upload_bytes = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<LarderConfig>("[server]\nworkers = 4\n").is_err());
    }
}
