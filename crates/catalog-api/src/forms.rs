//! Binding of the product form from a multipart submission.
//!
//! Field names follow the HTML form: `product[name]`, `product[description]`,
//! `product[price]`, one `product[images][N][id]` per image kept by the
//! reorder widget, and any number of `product[newImages][]` files.

use std::collections::BTreeMap;

use axum::extract::Multipart;
use uuid::Uuid;

use catalog_core::defaults::{MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
use catalog_core::{parse_price_cents, ImageUpload, ProductInput};

use crate::error::ApiError;

pub const NAME_FIELD: &str = "product[name]";
pub const DESCRIPTION_FIELD: &str = "product[description]";
pub const PRICE_FIELD: &str = "product[price]";
pub const NEW_IMAGES_FIELD: &str = "product[newImages][]";

/// Raw values of a submitted product form.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    /// Kept image ids in widget order.
    pub image_order: Vec<Uuid>,
    pub uploads: Vec<ImageUpload>,
}

/// Per-field message ids, keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, &'static str>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ProductForm {
    /// Read every field of the multipart body.
    ///
    /// File inputs left empty by the browser (no filename, no bytes) are
    /// skipped. An image id that is not a UUID is bound as the nil UUID,
    /// which never belongs to a product and so fails reconciliation.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = ProductForm::default();
        let mut order: Vec<(usize, usize, Uuid)> = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if is_new_images_field(&name) {
                let filename = field.file_name().unwrap_or("").to_string();
                let claimed_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                form.uploads
                    .push(ImageUpload::new(filename, claimed_type, data.to_vec()));
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?;

            match name.as_str() {
                NAME_FIELD => form.name = value,
                DESCRIPTION_FIELD => form.description = value,
                PRICE_FIELD => form.price = value,
                other => {
                    if let Some(index) = image_id_index(other) {
                        let id = Uuid::parse_str(value.trim()).unwrap_or(Uuid::nil());
                        order.push((index, order.len(), id));
                    }
                }
            }
        }

        order.sort_by_key(|(index, seen, _)| (*index, *seen));
        form.image_order = order.into_iter().map(|(_, _, id)| id).collect();
        Ok(form)
    }

    /// Check the descriptive fields and convert them to a [`ProductInput`].
    pub fn validate(&self) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert(NAME_FIELD, "field.required");
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.insert(NAME_FIELD, "field.too_long");
        }

        let description = self.description.trim();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            errors.insert(DESCRIPTION_FIELD, "field.too_long");
        }

        let price_cents = if self.price.trim().is_empty() {
            errors.insert(PRICE_FIELD, "field.required");
            None
        } else {
            let parsed = parse_price_cents(&self.price);
            if parsed.is_none() {
                errors.insert(PRICE_FIELD, "field.invalid_price");
            }
            parsed
        };

        match price_cents {
            Some(price_cents) if errors.is_empty() => Ok(ProductInput {
                name: name.to_string(),
                description: (!description.is_empty()).then(|| description.to_string()),
                price_cents,
            }),
            _ => Err(errors),
        }
    }
}

fn is_new_images_field(name: &str) -> bool {
    name == NEW_IMAGES_FIELD || name == "product[newImages]"
}

/// `N` of a `product[images][N][id]` field name.
fn image_id_index(name: &str) -> Option<usize> {
    name.strip_prefix("product[images][")?
        .strip_suffix("][id]")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, price: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            price: price.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_image_id_index() {
        assert_eq!(image_id_index("product[images][0][id]"), Some(0));
        assert_eq!(image_id_index("product[images][12][id]"), Some(12));
        assert_eq!(image_id_index("product[images][x][id]"), None);
        assert_eq!(image_id_index("product[images][0]"), None);
        assert_eq!(image_id_index("product[name]"), None);
    }

    #[test]
    fn test_new_images_field_names() {
        assert!(is_new_images_field("product[newImages][]"));
        assert!(is_new_images_field("product[newImages]"));
        assert!(!is_new_images_field("product[images][0][id]"));
    }

    #[test]
    fn test_validate_ok() {
        let mut f = form("  Lamp ", "19.99");
        f.description = "  ".to_string();
        let input = f.validate().unwrap();
        assert_eq!(input.name, "Lamp");
        assert_eq!(input.price_cents, 1999);
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_validate_collects_field_errors() {
        let errors = form("", "abc").validate().unwrap_err();
        assert_eq!(errors.get(NAME_FIELD), Some("field.required"));
        assert_eq!(errors.get(PRICE_FIELD), Some("field.invalid_price"));
        assert_eq!(errors.get(DESCRIPTION_FIELD), None);
    }

    #[test]
    fn test_validate_missing_price() {
        let errors = form("Lamp", " ").validate().unwrap_err();
        assert_eq!(errors.get(PRICE_FIELD), Some("field.required"));
    }

    #[test]
    fn test_validate_name_too_long() {
        let errors = form(&"x".repeat(MAX_NAME_LEN + 1), "1").validate().unwrap_err();
        assert_eq!(errors.get(NAME_FIELD), Some("field.too_long"));
    }

    #[test]
    fn test_first_error_per_field_wins() {
        let mut errors = FieldErrors::default();
        errors.insert(NAME_FIELD, "field.required");
        errors.insert(NAME_FIELD, "field.too_long");
        assert_eq!(errors.get(NAME_FIELD), Some("field.required"));
    }
}
