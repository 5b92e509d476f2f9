// src/server/uploads.rs
//! Image intake for recipe uploads
//!
//! Uploaded images are checked against an extension allow-list and a size
//! limit, then written to the upload directory under a sanitized version of
//! the client's filename. Two uploads that sanitize to the same name
//! overwrite each other, and images are never removed when a recipe is
//! updated or deleted.

use axum::body::Bytes;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from validating or storing an uploaded image
#[derive(Error, Debug)]
pub enum UploadError {
    /// Extension missing or not on the allow-list
    #[error("File extension not allowed: {file_name}")]
    DisallowedExtension { file_name: String },

    /// Upload exceeded the size limit
    #[error("Image is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    /// Filename has nothing left after sanitizing
    #[error("Invalid image filename: {file_name:?}")]
    InvalidName { file_name: String },

    /// Writing the image to disk failed
    #[error("Failed to store image {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// An image part received from a multipart form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Filename as sent by the client
    pub file_name: String,
    /// Total bytes received for this part
    pub size: u64,
    /// File content; left empty once `size` went past the limit
    pub contents: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        let contents = contents.into();
        Self {
            file_name: file_name.into(),
            size: contents.len() as u64,
            contents,
        }
    }
}

/// Validates and stores uploaded images in one directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    allowed_extensions: Vec<String>,
    max_bytes: u64,
}

impl ImageStore {
    pub fn new(dir: PathBuf, allowed_extensions: Vec<String>, max_bytes: u64) -> Self {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|ext| ext.to_lowercase())
            .collect();
        Self {
            dir,
            allowed_extensions,
            max_bytes,
        }
    }

    /// Directory images are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Size limit in bytes
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Allowed extensions, lowercased
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Whether the text after the last `.` is an allowed extension
    pub fn is_allowed(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }

    pub fn check_extension(&self, upload: &ImageUpload) -> Result<(), UploadError> {
        if self.is_allowed(&upload.file_name) {
            Ok(())
        } else {
            warn!("Rejected upload with disallowed extension: {}", upload.file_name);
            Err(UploadError::DisallowedExtension {
                file_name: upload.file_name.clone(),
            })
        }
    }

    pub fn check_size(&self, upload: &ImageUpload) -> Result<(), UploadError> {
        if upload.size > self.max_bytes {
            warn!(
                "Rejected oversized upload {} ({} bytes, limit {})",
                upload.file_name, upload.size, self.max_bytes
            );
            return Err(UploadError::TooLarge {
                size: upload.size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Write a validated upload and return its normalized path
    ///
    /// The caller checks extension and size first; `save` only refuses names
    /// that sanitize to nothing.
    pub async fn save(&self, upload: &ImageUpload) -> Result<String, UploadError> {
        let safe_name = secure_filename(&upload.file_name);
        if safe_name.is_empty() {
            return Err(UploadError::InvalidName {
                file_name: upload.file_name.clone(),
            });
        }

        let path = normalize_path(&self.dir.join(&safe_name));
        tokio::fs::write(&path, &upload.contents)
            .await
            .map_err(|source| UploadError::Io {
                path: path.clone(),
                source,
            })?;

        info!("Stored image {} ({} bytes)", path.display(), upload.size);
        Ok(path_to_string(&path))
    }

    /// URL path the image directory is served under, if it can be mounted
    ///
    /// Stored image paths double as URLs relative to the site root, so the
    /// directory is mounted at its own normalized path. Directories that
    /// normalize to `.` or climb out with `..` are not mounted.
    pub fn mount_path(&self) -> Option<String> {
        let normalized = path_to_string(&normalize_path(&self.dir));
        let trimmed = normalized.trim_start_matches('/');
        if trimmed.is_empty() || trimmed == "." || trimmed.starts_with("..") {
            return None;
        }
        Some(format!("/{}", trimmed))
    }
}

/// Reduce a client filename to a safe single path component
///
/// Non-ASCII characters are dropped, path separators and whitespace runs
/// become `_`, anything outside `[A-Za-z0-9_.-]` is removed and leading or
/// trailing `.`/`_` are stripped. The result may be empty.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name.chars().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '_' | '.' | '-'))
        .collect();
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Lexically normalize a path: drop `.` segments and fold `name/..` pairs
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal =
                    matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
