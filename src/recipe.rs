// src/recipe.rs
//! Recipe records and the in-memory operations on a recipe collection
//!
//! The collection is an ordered `Vec<Recipe>`; insertion order is the only
//! ordering and there is no secondary index. All lookups are linear scans.

use serde::{Deserialize, Serialize};

/// A single stored recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: u64,
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub location: String,
    /// Path of the stored image file
    pub image: String,
}

/// Fields required to create a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub name: String,
    /// Comma-separated ingredient list as submitted
    pub ingredients: String,
    pub instructions: String,
    pub location: String,
}

/// Fields supplied by an update request
///
/// `None` means the key was absent from the request. `Some("")` means it
/// was present but empty, which only [`Recipe::patch`] distinguishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub location: Option<String>,
    /// Path of a newly stored image
    pub image: Option<String>,
}

impl Recipe {
    /// Build a recipe from a create request
    pub fn new(id: u64, new: NewRecipe, image: String) -> Self {
        Self {
            id,
            name: new.name,
            ingredients: split_ingredients(&new.ingredients),
            instructions: new.instructions,
            location: new.location,
            image,
        }
    }

    /// Full update: every non-empty field overwrites, absent or empty keep
    /// the current value
    pub fn replace(&mut self, changes: RecipeChanges) {
        let RecipeChanges {
            name,
            ingredients,
            instructions,
            location,
            image,
        } = changes;

        if let Some(name) = non_empty(name) {
            self.name = name;
        }
        if let Some(ingredients) = non_empty(ingredients) {
            self.ingredients = split_ingredients(&ingredients);
        }
        if let Some(instructions) = non_empty(instructions) {
            self.instructions = instructions;
        }
        if let Some(location) = non_empty(location) {
            self.location = location;
        }
        if let Some(image) = image {
            self.image = image;
        }
    }

    /// Partial update: every field present in the request overwrites, even
    /// when empty
    pub fn patch(&mut self, changes: RecipeChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(ingredients) = changes.ingredients {
            self.ingredients = split_ingredients(&ingredients);
        }
        if let Some(instructions) = changes.instructions {
            self.instructions = instructions;
        }
        if let Some(location) = changes.location {
            self.location = location;
        }
        if let Some(image) = changes.image {
            self.image = image;
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Split a comma-separated ingredient list
///
/// Segments are kept verbatim: no trimming, empty segments survive.
pub fn split_ingredients(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Id for the next created recipe
///
/// This is `len + 1`, not `max + 1`: after a deletion the new id can collide
/// with a record that is still stored.
pub fn next_id(recipes: &[Recipe]) -> u64 {
    recipes.len() as u64 + 1
}

/// First recipe carrying `id`
pub fn find_by_id(recipes: &[Recipe], id: u64) -> Option<&Recipe> {
    recipes.iter().find(|r| r.id == id)
}

/// Mutable handle to the first recipe carrying `id`
pub fn find_by_id_mut(recipes: &mut [Recipe], id: u64) -> Option<&mut Recipe> {
    recipes.iter_mut().find(|r| r.id == id)
}

/// Recipes whose name contains `keyword`, ignoring case and surrounding
/// whitespace on both sides
pub fn search_by_name<'a>(recipes: &'a [Recipe], keyword: &str) -> Vec<&'a Recipe> {
    let needle = keyword.trim().to_lowercase();
    recipes
        .iter()
        .filter(|r| r.name.trim().to_lowercase().contains(&needle))
        .collect()
}

/// Remove the first recipe carrying `id`, returning it
pub fn remove_by_id(recipes: &mut Vec<Recipe>, id: u64) -> Option<Recipe> {
    let index = recipes.iter().position(|r| r.id == id)?;
    Some(recipes.remove(index))
}
