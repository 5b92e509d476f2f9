// src/store/mod.rs
//! Recipe storage trait and implementations
//!
//! Storage is whole-collection only: `load` materializes every recipe and
//! `save` overwrites everything. There is no append, no partial update and
//! no locking; two overlapping load/save cycles lose the first writer.

mod json;

pub use json::JsonFileStore;

use crate::error::Result;
use crate::recipe::Recipe;
use async_trait::async_trait;

/// Load/save boundary between request handlers and the persisted document
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Read the full collection in stored order
    ///
    /// A store with no backing document yet yields an empty collection.
    async fn load(&self) -> Result<Vec<Recipe>>;

    /// Replace the stored collection with `recipes`
    async fn save(&self, recipes: &[Recipe]) -> Result<()>;

    /// Create an empty backing document if none exists
    ///
    /// Default implementation does nothing.
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Human-readable location of the backing document (for logging)
    fn location(&self) -> String;
}
