//! Execution of validated image plans against rows and stored files.
//!
//! Writes run in two phases:
//! 1. new files are written to storage, then one transaction saves the
//!    product, deletes removed rows, repositions kept rows and inserts new
//!    ones. If anything fails, files written in this call are deleted.
//! 2. after commit, files of the rows actually deleted are freed. A failure
//!    here only leaves an unreferenced file behind and is logged.

use catalog_core::{
    Error, ImageChanges, ImagePlan, NewProductImage, PlannedImage, ProductImage,
    ProductImageRepository, ProductInput, ProductRepository, Result,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::Database;

impl Database {
    /// Create a product with the images of a creation plan.
    pub async fn create_product(&self, input: ProductInput, plan: ImagePlan) -> Result<Uuid> {
        let (records, written) = self.store_new_images(&plan.added).await?;

        match self.products.insert(input, records).await {
            Ok(id) => Ok(id),
            Err(e) => {
                self.storage.delete_all_best_effort(&written).await;
                Err(e)
            }
        }
    }

    /// Save an edited product and apply its image plan.
    ///
    /// When another edit changed the images first, this one still wins; it
    /// fails with `ValidationError::ImagesChanged` only if no image would
    /// remain.
    pub async fn update_product(
        &self,
        id: Uuid,
        input: ProductInput,
        plan: ImagePlan,
    ) -> Result<()> {
        let ImagePlan {
            reposition,
            removed,
            added,
        } = plan;

        let (records, written) = self.store_new_images(&added).await?;
        // Rebased onto the stored rows inside the transaction
        let changes = ImageChanges {
            reposition,
            removed: removed.iter().map(|i| i.id).collect(),
            added: records,
        };

        match self.products.update(id, input, changes).await {
            Ok(deleted) => {
                self.free_files(id, &deleted).await;
                Ok(())
            }
            Err(e) => {
                self.storage.delete_all_best_effort(&written).await;
                Err(e)
            }
        }
    }

    /// Delete a product, its image rows and their stored files.
    ///
    /// Returns the number of images removed.
    pub async fn delete_product(&self, id: Uuid) -> Result<usize> {
        let images = self.products.delete(id).await?;
        self.free_files(id, &images).await;
        Ok(images.len())
    }

    /// Load an image row and its stored bytes.
    pub async fn download_image(&self, image_id: Uuid) -> Result<(ProductImage, Vec<u8>)> {
        let image = self.images.get(image_id).await?;
        let data = self.storage.read(&image.storage_path).await.map_err(|e| {
            warn!(
                subsystem = "storage",
                component = "file_storage",
                op = "download",
                image_id = %image_id,
                storage_path = %image.storage_path,
                error = %e,
                "Stored file missing for image row"
            );
            match e {
                Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                    Error::ImageNotFound(image_id)
                }
                other => other,
            }
        })?;
        Ok((image, data))
    }

    /// Write the files of planned images, returning their rows and paths.
    ///
    /// On a write failure, files already written by this call are deleted.
    async fn store_new_images(
        &self,
        planned: &[PlannedImage],
    ) -> Result<(Vec<NewProductImage>, Vec<String>)> {
        let mut records = Vec::with_capacity(planned.len());
        let mut written = Vec::with_capacity(planned.len());

        for item in planned {
            let image_id = Uuid::now_v7();
            let stored = match self.storage.store(image_id, &item.image).await {
                Ok(stored) => stored,
                Err(e) => {
                    self.storage.delete_all_best_effort(&written).await;
                    return Err(e);
                }
            };
            written.push(stored.storage_path.clone());

            records.push(NewProductImage {
                id: image_id,
                storage_path: stored.storage_path,
                public_url: stored.public_url,
                display_name: item.image.display_name().to_string(),
                content_type: item.image.content_type().to_string(),
                size_bytes: item.image.size_bytes(),
                width: i32::try_from(item.image.width()).unwrap_or(i32::MAX),
                height: i32::try_from(item.image.height()).unwrap_or(i32::MAX),
                content_hash: stored.content_hash,
                position: item.position,
            });
        }

        Ok((records, written))
    }

    async fn free_files(&self, product_id: Uuid, images: &[ProductImage]) {
        if images.is_empty() {
            return;
        }
        let paths: Vec<String> = images.iter().map(|i| i.storage_path.clone()).collect();
        let freed = self.storage.delete_all_best_effort(&paths).await;

        info!(
            subsystem = "storage",
            component = "file_storage",
            op = "free",
            product_id = %product_id,
            removed_count = images.len(),
            freed = freed,
            "Freed image files"
        );
    }
}
