// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use larder::{create_router, JsonFileStore, Recipe, RecipeStore, ServerConfig, ServerState};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "larder-test-boundary-5c1e";

/// A router over temporary storage.
///
/// Keep the struct alive to prevent the TempDir cleanup.
pub struct TestApp {
    pub dir: TempDir,
    pub config: ServerConfig,
    pub app: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Build with a tweaked config (paths already point into the TempDir)
    pub fn with_config(tweak: impl FnOnce(&mut ServerConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("images");
        std::fs::create_dir_all(&upload_dir).unwrap();

        let mut config = ServerConfig {
            data_file: dir.path().join("data.json"),
            upload_dir,
            ..ServerConfig::default()
        };
        tweak(&mut config);

        let app = create_router(ServerState::new(&config));
        Self { dir, config, app }
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.config.data_file.clone())
    }

    /// Write recipes straight to the data file
    pub async fn seed(&self, recipes: &[Recipe]) {
        self.store().save(recipes).await.unwrap();
    }

    pub async fn stored(&self) -> Vec<Recipe> {
        self.store().load().await.unwrap()
    }

    /// Expected stored path for an uploaded image name
    pub fn image_path(&self, name: &str) -> String {
        self.config.upload_dir.join(name).to_string_lossy().into_owned()
    }

    /// Files currently in the upload directory
    pub fn uploaded_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.config.upload_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        files.sort();
        files
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().method(Method::GET).uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn form(&self, method: Method, uri: &str, form: Form) -> (StatusCode, Value) {
        let (content_type, body) = form.finish();
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }
}

/// Hand-assembled multipart/form-data body
#[derive(Default)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, contents: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(contents);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Soup form with every field and a small png
    pub fn soup() -> Self {
        Self::new()
            .text("name", "Soup")
            .text("ingredients", "water,salt")
            .text("instructions", "boil")
            .text("location", "Home")
            .file("image", "image.png", b"\x89PNG fake")
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={BOUNDARY}"), self.body)
    }
}

pub fn recipe(id: u64, name: &str) -> Recipe {
    Recipe {
        id,
        name: name.to_string(),
        ingredients: vec!["flour".to_string(), "water".to_string()],
        instructions: "mix".to_string(),
        location: "Kitchen".to_string(),
        image: format!("app/static/images/{}.png", id),
    }
}

pub fn message(body: &Value) -> &str {
    body["message"].as_str().unwrap_or_default()
}
