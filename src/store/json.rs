// src/store/json.rs
//! JSON file recipe store

use super::RecipeStore;
use crate::error::{Error, Result};
use crate::recipe::Recipe;
use async_trait::async_trait;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Recipe collection stored as a single pretty-printed JSON array
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize with 4-space indentation, the layout of existing data files
    fn encode(recipes: &[Recipe]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        recipes.serialize(&mut ser).map_err(Error::Encode)?;
        Ok(buf)
    }

    async fn write_document(&self, contents: Vec<u8>) -> Result<()> {
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|source| Error::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl RecipeStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Recipe>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No recipe document at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(Error::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| Error::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, recipes: &[Recipe]) -> Result<()> {
        let contents = Self::encode(recipes)?;
        self.write_document(contents).await?;
        debug!("Saved {} recipes to {}", recipes.len(), self.path.display());
        Ok(())
    }

    async fn init(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| Error::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        info!("Creating empty recipe document at {}", self.path.display());
        self.write_document(Self::encode(&[])?).await
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
