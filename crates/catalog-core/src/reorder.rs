//! State behind the drag-and-drop image reorder widget.
//!
//! The widget displays the product's current images and lets the user
//! reorder or remove them. Its only contract with the server is the set of
//! hidden fields it emits: one `product[images][N][id]` per image still
//! shown, in display order. The server reconciles against exactly that.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::ProductImage;
use crate::reconcile::reconcile_order;

/// One image shown by the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderItem {
    pub id: Uuid,
    pub name: String,
    pub url: String,
}

impl From<&ProductImage> for ReorderItem {
    fn from(image: &ProductImage) -> Self {
        Self {
            id: image.id,
            name: image.display_name.clone(),
            url: image.public_url.clone(),
        }
    }
}

/// Ordered list of images displayed by the widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderList {
    items: Vec<ReorderItem>,
}

impl ReorderList {
    /// Build the initial list from persisted images, ordered by position.
    pub fn from_images(images: &[ProductImage]) -> Self {
        let mut sorted: Vec<&ProductImage> = images.iter().collect();
        sorted.sort_by_key(|i| i.position);
        Self {
            items: sorted.into_iter().map(ReorderItem::from).collect(),
        }
    }

    pub fn items(&self) -> &[ReorderItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the displayed order with `order`.
    ///
    /// `order` must be a permutation of a subset of the displayed images.
    pub fn set_order(&mut self, order: &[Uuid]) -> Result<(), ValidationError> {
        let current: Vec<Uuid> = self.items.iter().map(|i| i.id).collect();
        let outcome = reconcile_order(&current, order)?;

        let mut remaining = std::mem::take(&mut self.items);
        self.items = outcome
            .kept
            .iter()
            .filter_map(|id| {
                let idx = remaining.iter().position(|item| item.id == *id)?;
                Some(remaining.swap_remove(idx))
            })
            .collect();
        Ok(())
    }

    /// Move the image at `from` to index `to`, shifting the others.
    ///
    /// Out-of-range indexes are ignored, as a drop outside the list would be.
    pub fn move_item(&mut self, from: usize, to: usize) {
        if from >= self.items.len() || to >= self.items.len() {
            return;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
    }

    /// Stop displaying an image. Returns whether it was present.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    /// Hidden form fields, as `(name, value)` pairs in display order.
    pub fn hidden_fields(&self) -> Vec<(String, String)> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| (hidden_field_name(idx), item.id.to_string()))
            .collect()
    }
}

/// Name of the hidden input carrying the identifier at `index`.
pub fn hidden_field_name(index: usize) -> String {
    format!("product[images][{}][id]", index)
}
