// src/error.rs
//! Error types for recipe storage

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing the recipe document
#[derive(Error, Debug)]
pub enum Error {
    /// The recipe document exists but could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The recipe document could not be written
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The stored content is not a well-formed recipe collection
    #[error("Malformed recipe data in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The collection could not be serialized
    #[error("Failed to encode recipe data: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result alias for storage operations
pub type Result<T> = std::result::Result<T, Error>;
