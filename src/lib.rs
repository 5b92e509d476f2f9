// src/lib.rs

//! Larder Recipe Service
//!
//! Small HTTP service for a catalogue of recipes, each paired with an
//! uploaded image.
//!
//! # Architecture
//!
//! - Flat-file storage: the whole collection lives in one JSON document
//! - Whole-collection requests: every handler loads, edits and rewrites it
//! - Image intake: uploads are validated and stored under a sanitized name
//! - Last writer wins: no locking between concurrent mutations

mod error;
pub mod recipe;
pub mod server;
pub mod store;

pub use error::{Error, Result};
pub use recipe::{NewRecipe, Recipe, RecipeChanges};
pub use server::{create_router, run_server, ServerConfig, ServerState};
pub use store::{JsonFileStore, RecipeStore};
