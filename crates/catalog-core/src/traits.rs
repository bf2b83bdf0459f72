//! Repository interfaces for the product catalog.
//!
//! Concrete PostgreSQL implementations live in `catalog-db`.

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::defaults::FIRST_IMAGE_POSITION;
use crate::error::{Result, ValidationError};
use crate::lifecycle::PositionUpdate;
use crate::models::*;
use crate::search::{PageRequest, ProductPage, ProductSearch};

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Row to insert for an image whose bytes are already stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductImage {
    pub id: Uuid,
    pub storage_path: String,
    pub public_url: String,
    pub display_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
    pub content_hash: String,
    pub position: i32,
}

/// Image row changes applied together with a product update.
#[derive(Debug, Clone, Default)]
pub struct ImageChanges {
    /// New positions for kept images.
    pub reposition: Vec<PositionUpdate>,
    /// Image rows to delete.
    pub removed: Vec<Uuid>,
    /// Image rows to insert.
    pub added: Vec<NewProductImage>,
}

impl ImageChanges {
    /// Rebase these changes onto the rows stored for the product right now.
    ///
    /// The later write wins: stored rows the edit did not keep are removed,
    /// including rows added by another edit since this one was planned. Kept
    /// rows that were removed meanwhile are skipped and positions are
    /// renumbered, new images after the kept ones. Returns the rows to delete.
    /// Fails when no image would remain.
    pub fn rebase(
        &mut self,
        product_id: Uuid,
        current: &[ProductImage],
    ) -> std::result::Result<Vec<ProductImage>, ValidationError> {
        let stored: HashSet<Uuid> = current.iter().map(|image| image.id).collect();
        self.reposition.retain(|u| stored.contains(&u.image_id));
        if self.reposition.is_empty() && self.added.is_empty() {
            return Err(ValidationError::ImagesChanged(product_id));
        }

        let positions = (FIRST_IMAGE_POSITION..).zip(
            self.reposition
                .iter_mut()
                .map(|u| &mut u.position)
                .chain(self.added.iter_mut().map(|i| &mut i.position)),
        );
        for (position, slot) in positions {
            *slot = position;
        }

        let kept: HashSet<Uuid> = self.reposition.iter().map(|u| u.image_id).collect();
        let removed: Vec<ProductImage> = current
            .iter()
            .filter(|image| !kept.contains(&image.id))
            .cloned()
            .collect();
        self.removed = removed.iter().map(|image| image.id).collect();
        Ok(removed)
    }
}

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

/// Repository for products and their owned image rows.
///
/// Every write runs in a single transaction: either the product and all of
/// its image rows change together, or nothing does.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product with its initial images.
    async fn insert(&self, input: ProductInput, images: Vec<NewProductImage>) -> Result<Uuid>;

    /// Update a product's fields and apply image row changes in one
    /// transaction.
    ///
    /// `changes` is rebased onto the rows stored at commit time; the rows
    /// actually deleted are returned so their files can be freed.
    async fn update(
        &self,
        id: Uuid,
        input: ProductInput,
        changes: ImageChanges,
    ) -> Result<Vec<ProductImage>>;

    /// Delete a product and return the image rows removed with it.
    async fn delete(&self, id: Uuid) -> Result<Vec<ProductImage>>;

    /// Fetch a product with its images ordered by position.
    async fn fetch(&self, id: Uuid) -> Result<Option<ProductWithImages>>;

    /// Check whether a product exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;

    /// Filtered, paginated listing.
    async fn list(&self, search: &ProductSearch, page: PageRequest) -> Result<ProductPage>;
}

/// Read access to individual image rows.
#[async_trait]
pub trait ProductImageRepository: Send + Sync {
    /// Get an image by ID.
    async fn get(&self, id: Uuid) -> Result<ProductImage>;

    /// List a product's images ordered by position.
    async fn list_by_product(&self, product_id: Uuid) -> Result<Vec<ProductImage>>;
}
