// src/server/routes.rs
//! Axum router configuration for the recipe API
//!
//! - JSON API under /api/recipes (compressed)
//! - Stored images served from the path recorded on each recipe
//! - Permissive CORS for browser clients

use crate::server::handlers::recipes;
use crate::server::ServerState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

/// Room for the text parts of a form on top of the image limit
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the main application router
pub fn create_router(state: ServerState) -> Router {
    // CORS configuration - permissive, the API has no credentials
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = usize::try_from(state.images.max_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    let image_mount = state
        .images
        .mount_path()
        .map(|mount| (mount, state.images.dir().to_path_buf()));

    let state = Arc::new(RwLock::new(state));

    let api_routes = Router::new()
        .route(
            "/api/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route("/api/recipes/search/:term", get(recipes::search_recipes))
        .route(
            "/api/recipes/:id",
            put(recipes::replace_recipe)
                .patch(recipes::patch_recipe)
                .delete(recipes::delete_recipe),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .with_state(state);

    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(api_routes);

    if let Some((mount, dir)) = image_mount {
        info!("Serving images from {} at {}", dir.display(), mount);
        app = app.nest_service(&mount, ServeDir::new(dir));
    }

    app.layer(cors)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ServerConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_config(dir: &TempDir) -> ServerConfig {
        ServerConfig {
            data_file: dir.path().join("data.json"),
            upload_dir: dir.path().join("images"),
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = TempDir::new().unwrap();
        let app = create_router(ServerState::new(&test_config(&dir)));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_serves_stored_images() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        std::fs::create_dir_all(&config.upload_dir).unwrap();
        std::fs::write(config.upload_dir.join("soup.png"), b"png").unwrap();

        let uri = format!("{}/soup.png", config.upload_dir.display());
        let app = create_router(ServerState::new(&config));

        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let dir = TempDir::new().unwrap();
        let app = create_router(ServerState::new(&test_config(&dir)));

        let response = app
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
