//! Product repository implementation.

use std::time::Instant;

use async_trait::async_trait;
use catalog_core::{
    Error, ImageChanges, NewProductImage, PageRequest, Product, ProductImage,
    ProductImageRepository, ProductInput, ProductPage, ProductRepository, ProductSearch,
    ProductSummary, ProductWithImages, Result,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::listing::{ProductListQueryBuilder, QueryParam};
use crate::product_images::PgProductImageRepository;

/// PostgreSQL implementation of ProductRepository.
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
    images: PgProductImageRepository,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            images: PgProductImageRepository::new(pool.clone()),
            pool,
        }
    }
}

fn product_from_row(row: &PgRow) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price_cents: row.get("price_cents"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn insert(&self, input: ProductInput, images: Vec<NewProductImage>) -> Result<Uuid> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let id = self.insert_tx(&mut tx, &input, &images).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "products",
            op = "insert",
            product_id = %id,
            image_count = images.len(),
            "Product created"
        );
        Ok(id)
    }

    async fn update(
        &self,
        id: Uuid,
        input: ProductInput,
        mut changes: ImageChanges,
    ) -> Result<Vec<ProductImage>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let removed = self.update_tx(&mut tx, id, &input, &mut changes).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "products",
            op = "update",
            product_id = %id,
            kept_count = changes.reposition.len(),
            removed_count = removed.len(),
            added_count = changes.added.len(),
            "Product updated"
        );
        Ok(removed)
    }

    async fn delete(&self, id: Uuid) -> Result<Vec<ProductImage>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let images = self.delete_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "products",
            op = "delete",
            product_id = %id,
            image_count = images.len(),
            "Product deleted"
        );
        Ok(images)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<ProductWithImages>> {
        let row = sqlx::query(
            "SELECT id, name, description, price_cents, created_at, updated_at
             FROM product WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let images = self.images.list_by_product(id).await?;
        Ok(Some(ProductWithImages {
            product: product_from_row(&row),
            images,
        }))
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM product WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.0)
    }

    async fn list(&self, search: &ProductSearch, page: PageRequest) -> Result<ProductPage> {
        let start = Instant::now();
        let builder = ProductListQueryBuilder::new(search, 0);
        let (where_sql, params) = builder.build_where();

        let count_sql = format!("SELECT COUNT(*) FROM product p WHERE {}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for param in &params {
            count_q = match param {
                QueryParam::String(s) => count_q.bind(s),
                QueryParam::BigInt(v) => count_q.bind(v),
            };
        }
        let total = count_q
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let list_sql = format!(
            r#"SELECT p.id, p.name, p.description, p.price_cents, p.created_at,
                      (SELECT COUNT(*) FROM product_image i WHERE i.product_id = p.id) AS image_count,
                      (SELECT i.public_url FROM product_image i
                        WHERE i.product_id = p.id ORDER BY i.position LIMIT 1) AS cover_url
               FROM product p
               WHERE {}
               ORDER BY {}
               LIMIT ${} OFFSET ${}"#,
            where_sql,
            builder.build_order_by(),
            params.len() + 1,
            params.len() + 2
        );
        let mut list_q = sqlx::query(&list_sql);
        for param in &params {
            list_q = match param {
                QueryParam::String(s) => list_q.bind(s),
                QueryParam::BigInt(v) => list_q.bind(v),
            };
        }
        list_q = list_q.bind(page.limit()).bind(page.offset());

        let rows = list_q
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let items: Vec<ProductSummary> = rows
            .iter()
            .map(|row| ProductSummary {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
                price_cents: row.get("price_cents"),
                created_at: row.get("created_at"),
                image_count: row.get("image_count"),
                cover_url: row.get("cover_url"),
            })
            .collect();

        debug!(
            subsystem = "db",
            component = "products",
            op = "list",
            result_count = items.len(),
            total = total,
            page = page.page,
            duration_ms = start.elapsed().as_millis() as u64,
            "Listed products"
        );

        Ok(ProductPage {
            items,
            total,
            page: page.page,
            page_size: page.page_size,
        })
    }
}

/// Transaction-aware variants.
impl PgProductRepository {
    /// Transaction-aware variant of insert.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        input: &ProductInput,
        images: &[NewProductImage],
    ) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO product (id, name, description, price_cents) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price_cents)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        self.images.insert_tx(tx, id, images).await?;
        Ok(id)
    }

    /// Transaction-aware variant of update.
    ///
    /// The product row update serializes concurrent edits of one product.
    /// The image rows are then locked and `changes` is rebased onto them, so
    /// the later edit wins. Removed rows are deleted before kept rows move,
    /// then new rows are inserted; the position uniqueness check runs at
    /// commit.
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        input: &ProductInput,
        changes: &mut ImageChanges,
    ) -> Result<Vec<ProductImage>> {
        let result = sqlx::query(
            "UPDATE product SET name = $2, description = $3, price_cents = $4, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price_cents)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ProductNotFound(id));
        }

        let current = self.images.list_by_product_tx(tx, id).await?;
        let planned_removals = changes.removed.len();
        let removed = changes.rebase(id, &current)?;
        if removed.len() != planned_removals {
            warn!(
                subsystem = "db",
                component = "products",
                op = "update",
                product_id = %id,
                planned_removals,
                removed_count = removed.len(),
                "Image rows changed since the edit was planned"
            );
        }

        self.images.delete_many_tx(tx, id, &changes.removed).await?;
        self.images.reposition_tx(tx, id, &changes.reposition).await?;
        self.images.insert_tx(tx, id, &changes.added).await?;
        Ok(removed)
    }

    /// Transaction-aware variant of delete.
    ///
    /// Image rows go with the product through the cascading foreign key;
    /// they are read first so the caller can free their files.
    pub async fn delete_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Vec<ProductImage>> {
        let images = self.images.list_by_product_tx(tx, id).await?;

        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ProductNotFound(id));
        }
        Ok(images)
    }
}
