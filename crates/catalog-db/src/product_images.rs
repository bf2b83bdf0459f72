//! Product image rows.
//!
//! Rows only; the bytes they point at are managed by
//! [`crate::file_storage::ImageStorage`]. Writes happen inside the
//! transaction of the owning product, so every mutating method here takes a
//! caller-supplied transaction.

use async_trait::async_trait;
use catalog_core::{
    Error, NewProductImage, PositionUpdate, ProductImage, ProductImageRepository, Result,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

const IMAGE_COLUMNS: &str = "id, product_id, storage_path, public_url, display_name, \
     content_type, size_bytes, width, height, content_hash, position, created_at";

/// PostgreSQL implementation of ProductImageRepository.
#[derive(Clone)]
pub struct PgProductImageRepository {
    pool: PgPool,
}

impl PgProductImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn product_image_from_row(row: &PgRow) -> ProductImage {
    ProductImage {
        id: row.get("id"),
        product_id: row.get("product_id"),
        storage_path: row.get("storage_path"),
        public_url: row.get("public_url"),
        display_name: row.get("display_name"),
        content_type: row.get("content_type"),
        size_bytes: row.get("size_bytes"),
        width: row.get("width"),
        height: row.get("height"),
        content_hash: row.get("content_hash"),
        position: row.get("position"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ProductImageRepository for PgProductImageRepository {
    async fn get(&self, id: Uuid) -> Result<ProductImage> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM product_image WHERE id = $1",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::ImageNotFound(id))?;

        Ok(product_image_from_row(&row))
    }

    async fn list_by_product(&self, product_id: Uuid) -> Result<Vec<ProductImage>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM product_image WHERE product_id = $1 ORDER BY position",
            IMAGE_COLUMNS
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(product_image_from_row).collect())
    }
}

/// Transaction-aware operations used by product writes.
impl PgProductImageRepository {
    /// Transaction-aware variant of list_by_product.
    pub async fn list_by_product_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
    ) -> Result<Vec<ProductImage>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM product_image WHERE product_id = $1 ORDER BY position FOR UPDATE",
            IMAGE_COLUMNS
        ))
        .bind(product_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(product_image_from_row).collect())
    }

    /// Insert image rows for a product.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        images: &[NewProductImage],
    ) -> Result<()> {
        for image in images {
            sqlx::query(
                r#"INSERT INTO product_image
                   (id, product_id, storage_path, public_url, display_name, content_type,
                    size_bytes, width, height, content_hash, position)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
            )
            .bind(image.id)
            .bind(product_id)
            .bind(&image.storage_path)
            .bind(&image.public_url)
            .bind(&image.display_name)
            .bind(&image.content_type)
            .bind(image.size_bytes)
            .bind(image.width)
            .bind(image.height)
            .bind(&image.content_hash)
            .bind(image.position)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        }
        Ok(())
    }

    /// Set new positions for kept images of a product.
    ///
    /// Rows that do not belong to `product_id` are not touched; a mismatch in
    /// the affected row count is reported as a missing image.
    pub async fn reposition_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        updates: &[PositionUpdate],
    ) -> Result<()> {
        for update in updates {
            let result = sqlx::query(
                "UPDATE product_image SET position = $3 WHERE id = $1 AND product_id = $2",
            )
            .bind(update.image_id)
            .bind(product_id)
            .bind(update.position)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

            if result.rows_affected() == 0 {
                return Err(Error::ImageNotFound(update.image_id));
            }
        }
        Ok(())
    }

    /// Delete image rows of a product. Returns the number of rows removed.
    pub async fn delete_many_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        image_ids: &[Uuid],
    ) -> Result<u64> {
        if image_ids.is_empty() {
            return Ok(0);
        }
        let result =
            sqlx::query("DELETE FROM product_image WHERE product_id = $1 AND id = ANY($2)")
                .bind(product_id)
                .bind(image_ids)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
