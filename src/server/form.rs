// src/server/form.rs
//! Multipart form decoding for create and update requests
//!
//! Text parts `name`, `ingredients`, `instructions` and `location` are
//! collected as-is; the first occurrence of a repeated key wins and unknown
//! keys are ignored. The `image` part only counts as an upload when it
//! carries a non-empty filename.

use crate::recipe::{NewRecipe, RecipeChanges};
use crate::server::error::ApiError;
use crate::server::uploads::ImageUpload;
use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;

/// Decoded recipe form
#[derive(Debug, Default)]
pub struct RecipeForm {
    pub name: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub location: Option<String>,
    pub image: Option<ImageUpload>,
    /// The body limit cut the request short; later parts never arrived
    pub truncated: bool,
}

impl RecipeForm {
    /// Read every part of the request body
    ///
    /// Image bytes are buffered up to `max_image_bytes`; past that the part is
    /// still counted but its content is dropped, so an oversized upload is
    /// never held in memory or written anywhere.
    pub async fn read(mut multipart: Multipart, max_image_bytes: u64) -> Result<Self, ApiError> {
        let mut form = RecipeForm::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) if is_body_limit(&e) => {
                    form.mark_truncated(max_image_bytes);
                    break;
                }
                Err(e) => return Err(ApiError::MalformedForm(e.body_text())),
            };

            let Some(key) = field.name().map(str::to_string) else {
                continue;
            };

            if key == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() || form.image.is_some() {
                    continue;
                }
                let (upload, truncated) = read_image(field, file_name, max_image_bytes).await?;
                form.image = Some(upload);
                if truncated {
                    form.truncated = true;
                    break;
                }
                continue;
            }

            let slot = match key.as_str() {
                "name" => &mut form.name,
                "ingredients" => &mut form.ingredients,
                "instructions" => &mut form.instructions,
                "location" => &mut form.location,
                _ => continue,
            };
            if slot.is_some() {
                continue;
            }
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::MalformedForm(e.body_text()))?;
            *slot = Some(value);
        }

        Ok(form)
    }

    /// Fields for a create request; all four must be present and non-empty
    pub fn new_recipe(&self) -> Result<NewRecipe, ApiError> {
        let required = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(ApiError::MissingFields)
        };

        Ok(NewRecipe {
            name: required(&self.name)?,
            ingredients: required(&self.ingredients)?,
            instructions: required(&self.instructions)?,
            location: required(&self.location)?,
        })
    }

    /// Fields for an update request, with the path of an already stored image
    pub fn changes(self, image: Option<String>) -> RecipeChanges {
        RecipeChanges {
            name: self.name,
            ingredients: self.ingredients,
            instructions: self.instructions,
            location: self.location,
            image,
        }
    }

    /// Reject a form the body limit cut short, before any field checks
    ///
    /// Parts after the image are lost when the body limit trips, so missing
    /// fields would otherwise hide the real cause.
    pub fn check_complete(&self, max_image_bytes: u64) -> Result<(), ApiError> {
        if self.truncated {
            return Err(ApiError::TooLarge {
                limit: max_image_bytes,
            });
        }
        Ok(())
    }

    /// The body limit cut the request short: make sure any image reads as oversized
    fn mark_truncated(&mut self, max_image_bytes: u64) {
        self.truncated = true;
        if let Some(image) = self.image.as_mut() {
            image.size = image.size.max(max_image_bytes + 1);
            image.contents = Bytes::new();
        }
    }
}

fn is_body_limit(err: &MultipartError) -> bool {
    err.status() == StatusCode::PAYLOAD_TOO_LARGE
}

/// Stream one image part, returning whether the body limit cut it short
async fn read_image(
    mut field: Field<'_>,
    file_name: String,
    max_bytes: u64,
) -> Result<(ImageUpload, bool), ApiError> {
    let mut buf: Vec<u8> = Vec::new();
    let mut size: u64 = 0;
    let mut truncated = false;

    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                size += chunk.len() as u64;
                if size <= max_bytes {
                    buf.extend_from_slice(&chunk);
                } else {
                    buf = Vec::new();
                }
            }
            Ok(None) => break,
            Err(e) if is_body_limit(&e) => {
                size = size.max(max_bytes + 1);
                truncated = true;
                break;
            }
            Err(e) => return Err(ApiError::MalformedForm(e.body_text())),
        }
    }

    let contents = if size > max_bytes {
        Bytes::new()
    } else {
        Bytes::from(buf)
    };

    Ok((
        ImageUpload {
            file_name,
            size,
            contents,
        },
        truncated,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, ingredients: &str, instructions: &str, location: &str) -> RecipeForm {
        RecipeForm {
            name: Some(name.to_string()),
            ingredients: Some(ingredients.to_string()),
            instructions: Some(instructions.to_string()),
            location: Some(location.to_string()),
            image: None,
            truncated: false,
        }
    }

    #[test]
    fn test_new_recipe_requires_all_fields() {
        let ok = form("Soup", "water,salt", "boil", "Home").new_recipe().unwrap();
        assert_eq!(ok.name, "Soup");
        assert_eq!(ok.ingredients, "water,salt");

        let empty = form("Soup", "", "boil", "Home").new_recipe();
        assert!(matches!(empty, Err(ApiError::MissingFields)));

        let mut missing = form("Soup", "water", "boil", "Home");
        missing.location = None;
        assert!(matches!(missing.new_recipe(), Err(ApiError::MissingFields)));
    }

    #[test]
    fn test_changes_carry_presence() {
        let f = RecipeForm {
            location: Some(String::new()),
            ..Default::default()
        };

        let changes = f.changes(Some("images/a.png".to_string()));
        assert_eq!(changes.name, None);
        assert_eq!(changes.location.as_deref(), Some(""));
        assert_eq!(changes.image.as_deref(), Some("images/a.png"));
    }

    #[test]
    fn test_truncated_form_is_too_large() {
        let mut cut = form("Soup", "", "", "");
        assert!(cut.check_complete(16).is_ok());

        cut.mark_truncated(16);
        assert!(matches!(
            cut.check_complete(16),
            Err(ApiError::TooLarge { limit: 16 })
        ));
    }
}
