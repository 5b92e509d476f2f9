// src/server/error.rs
//! HTTP error responses for the recipe API
//!
//! Every handler failure ends up here and is turned into a status code plus
//! a JSON body with a single `message` field. The message strings are the
//! ones existing clients already display.

use crate::server::uploads::UploadError;
use axum::{
    extract::{multipart::MultipartRejection, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Body of every error response and of the delete confirmation
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub const DELETED_MESSAGE: &str = "Resep berhasil dihapus";

#[derive(Error, Debug)]
pub enum ApiError {
    /// No recipe matched the id or keyword
    #[error("Resep tidak ditemukan")]
    NotFound,

    /// A required text field is missing or empty on create
    #[error("Semua data harus diisi")]
    MissingFields,

    /// No usable image on create
    #[error("Gambar tidak valid atau tidak ada")]
    InvalidImage,

    /// Extension not on the allow-list; `allowed` is listed on create only
    #[error("{}", extension_message(.allowed))]
    ExtensionNotAllowed { allowed: Option<Vec<String>> },

    /// Upload larger than the configured limit
    #[error("Ukuran file terlalu besar. Maksimal {}", format_limit(.limit))]
    TooLarge { limit: u64 },

    /// The multipart body could not be read
    #[error("Data formulir tidak valid: {0}")]
    MalformedForm(String),

    /// Storage or filesystem failure
    #[error("Terjadi kesalahan: {0}")]
    Internal(String),
}

fn extension_message(allowed: &Option<Vec<String>>) -> String {
    match allowed {
        Some(list) => format!(
            "Ekstensi file tidak diperbolehkan. Hanya file {} yang diizinkan",
            list.join(", ")
        ),
        None => "Ekstensi file tidak diperbolehkan".to_string(),
    }
}

/// Render a byte limit the way the message catalog spells it ("2MB")
fn format_limit(bytes: &u64) -> String {
    let bytes = *bytes;
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{}B", bytes)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MissingFields
            | ApiError::InvalidImage
            | ApiError::ExtensionNotAllowed { .. }
            | ApiError::TooLarge { .. }
            | ApiError::MalformedForm(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map an upload failure; `allowed` is the extension hint for create
    pub fn from_upload(err: UploadError, allowed: Option<&[String]>) -> Self {
        match err {
            UploadError::DisallowedExtension { .. } => ApiError::ExtensionNotAllowed {
                allowed: allowed.map(<[String]>::to_vec),
            },
            UploadError::TooLarge { limit, .. } => ApiError::TooLarge { limit },
            UploadError::InvalidName { .. } => ApiError::InvalidImage,
            UploadError::Io { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::MalformedForm(rejection.body_text())
    }
}

/// A path segment that cannot be decoded names no recipe
impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::NotFound
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(MessageBody::new(self.to_string()))).into_response()
    }
}
