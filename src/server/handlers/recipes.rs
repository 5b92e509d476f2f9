// src/server/handlers/recipes.rs
//! Recipe CRUD handlers
//!
//! Every handler loads the whole collection, works on it in memory and, when
//! it changed something, writes the whole collection back. Handlers only
//! take the state read lock, so concurrent mutations are not serialized and
//! the last save wins.

use crate::recipe::{self, Recipe, RecipeChanges};
use crate::server::error::{ApiError, MessageBody, DELETED_MESSAGE};
use crate::server::form::RecipeForm;
use crate::server::ServerState;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::PathRejection,
        Multipart, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

type SharedState = State<Arc<RwLock<ServerState>>>;

// Extractor failures are taken as values so they answer with the JSON
// error body instead of axum's plain-text rejection.
type FormBody = Result<Multipart, MultipartRejection>;
type IdPath = Result<Path<String>, PathRejection>;

/// How an update applies the submitted fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateMode {
    /// PUT: empty or absent fields keep their value
    Replace,
    /// PATCH: every present field overwrites
    Patch,
}

/// Parse an id path segment; only plain ASCII digits count
fn parse_id(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// GET /api/recipes
pub async fn list_recipes(State(state): SharedState) -> Result<Json<Vec<Recipe>>, ApiError> {
    let state = state.read().await;
    let recipes = state.store.load().await?;
    debug!("Listing {} recipes", recipes.len());
    Ok(Json(recipes))
}

/// GET /api/recipes/search/:term
///
/// A numeric term is an id lookup returning one recipe; anything else is a
/// keyword search over names returning every match. Both answer 404 when
/// nothing matched.
pub async fn search_recipes(
    State(state): SharedState,
    term: IdPath,
) -> Result<Response, ApiError> {
    let Path(term) = term?;
    let state = state.read().await;
    let recipes = state.store.load().await?;

    if let Some(id) = parse_id(&term) {
        let recipe = recipe::find_by_id(&recipes, id).ok_or(ApiError::NotFound)?;
        return Ok(Json(recipe).into_response());
    }

    let matches = recipe::search_by_name(&recipes, &term);
    if matches.is_empty() {
        return Err(ApiError::NotFound);
    }
    debug!("Keyword {:?} matched {} recipes", term, matches.len());
    Ok(Json(matches).into_response())
}

/// POST /api/recipes
///
/// Requires every text field and a valid image. The new id is the current
/// collection length plus one.
pub async fn create_recipe(
    State(state): SharedState,
    multipart: FormBody,
) -> Result<Response, ApiError> {
    let multipart = multipart?;
    let state = state.read().await;
    let form = RecipeForm::read(multipart, state.images.max_bytes()).await?;
    form.check_complete(state.images.max_bytes())?;

    let new = form.new_recipe()?;
    let upload = form.image.as_ref().ok_or(ApiError::InvalidImage)?;

    let allowed = Some(state.images.allowed_extensions());
    state
        .images
        .check_extension(upload)
        .map_err(|e| ApiError::from_upload(e, allowed))?;
    state
        .images
        .check_size(upload)
        .map_err(|e| ApiError::from_upload(e, allowed))?;
    let image = state
        .images
        .save(upload)
        .await
        .map_err(|e| ApiError::from_upload(e, allowed))?;

    let mut recipes = state.store.load().await?;
    let recipe = Recipe::new(recipe::next_id(&recipes), new, image);
    recipes.push(recipe.clone());
    state.store.save(&recipes).await?;

    info!("Created recipe {} ({})", recipe.id, recipe.name);
    Ok((StatusCode::CREATED, Json(recipe)).into_response())
}

/// PUT /api/recipes/:id
pub async fn replace_recipe(
    state: SharedState,
    id: IdPath,
    multipart: FormBody,
) -> Result<Json<Recipe>, ApiError> {
    let Path(id) = id?;
    update_recipe(state, &id, multipart?, UpdateMode::Replace).await
}

/// PATCH /api/recipes/:id
pub async fn patch_recipe(
    state: SharedState,
    id: IdPath,
    multipart: FormBody,
) -> Result<Json<Recipe>, ApiError> {
    let Path(id) = id?;
    update_recipe(state, &id, multipart?, UpdateMode::Patch).await
}

async fn update_recipe(
    State(state): SharedState,
    id: &str,
    multipart: Multipart,
    mode: UpdateMode,
) -> Result<Json<Recipe>, ApiError> {
    let state = state.read().await;
    let id = parse_id(id).ok_or(ApiError::NotFound)?;

    let mut recipes = state.store.load().await?;
    if recipe::find_by_id(&recipes, id).is_none() {
        return Err(ApiError::NotFound);
    }

    let mut form = RecipeForm::read(multipart, state.images.max_bytes()).await?;
    form.check_complete(state.images.max_bytes())?;

    let image = match form.image.take() {
        Some(upload) => {
            state
                .images
                .check_size(&upload)
                .map_err(|e| ApiError::from_upload(e, None))?;
            state
                .images
                .check_extension(&upload)
                .map_err(|e| ApiError::from_upload(e, None))?;
            let path = state
                .images
                .save(&upload)
                .await
                .map_err(|e| ApiError::from_upload(e, None))?;
            Some(path)
        }
        None => None,
    };

    let changes: RecipeChanges = form.changes(image);
    let target = recipe::find_by_id_mut(&mut recipes, id).ok_or(ApiError::NotFound)?;
    match mode {
        UpdateMode::Replace => target.replace(changes),
        UpdateMode::Patch => target.patch(changes),
    }
    let updated = target.clone();

    state.store.save(&recipes).await?;

    info!("Updated recipe {} ({:?})", id, mode);
    Ok(Json(updated))
}

/// DELETE /api/recipes/:id
///
/// Removes the first recipe with this id. A second delete of the same id
/// answers 404.
pub async fn delete_recipe(
    State(state): SharedState,
    id: IdPath,
) -> Result<Json<MessageBody>, ApiError> {
    let Path(id) = id?;
    let state = state.read().await;
    let id = parse_id(&id).ok_or(ApiError::NotFound)?;

    let mut recipes = state.store.load().await?;
    let removed = recipe::remove_by_id(&mut recipes, id).ok_or(ApiError::NotFound)?;
    state.store.save(&recipes).await?;

    info!("Deleted recipe {} ({})", removed.id, removed.name);
    Ok(Json(MessageBody::new(DELETED_MESSAGE)))
}
