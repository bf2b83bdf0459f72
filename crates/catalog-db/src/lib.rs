//! # catalog-db
//!
//! PostgreSQL persistence and image file storage for the product catalog.
//!
//! This crate provides:
//! - Connection pool management
//! - Product and product image repositories
//! - Filtered, paginated product listing
//! - Image file storage with a filesystem backend
//! - Two-phase execution of image plans (rows in one transaction, files
//!   freed after commit)
//!
//! ## Example
//!
//! ```rust,ignore
//! use catalog_db::{Database, FilesystemBackend, ImageStorage, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = ImageStorage::new(FilesystemBackend::new("/var/lib/catalog/files"), "/media");
//!     let db = Database::connect("postgres://localhost/catalog", PoolConfig::default(), storage).await?;
//!
//!     let plan = manager.plan_create(uploads)?;
//!     let id = db.create_product(input, plan).await?;
//!     println!("Created product: {}", id);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod file_storage;
pub mod listing;
pub mod pool;
pub mod product_images;
pub mod products;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use catalog_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use file_storage::{
    compute_content_hash, generate_storage_path, FilesystemBackend, ImageStorage, StorageBackend,
};
pub use listing::{ProductListQueryBuilder, QueryParam};
pub use pool::{log_pool_metrics, PoolConfig};
pub use product_images::PgProductImageRepository;
pub use products::PgProductRepository;

/// Combined database context: repositories plus image file storage.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Product repository (owns image rows through transactions).
    pub products: PgProductRepository,
    /// Read access to individual image rows.
    pub images: PgProductImageRepository,
    /// Stored image bytes.
    pub storage: ImageStorage,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>, storage: ImageStorage) -> Self {
        Self {
            products: PgProductRepository::new(pool.clone()),
            images: PgProductImageRepository::new(pool.clone()),
            storage,
            pool,
        }
    }

    /// Connect a pool sized by `config` to the given URL.
    pub async fn connect(url: &str, config: PoolConfig, storage: ImageStorage) -> Result<Self> {
        let pool = config.connect(url).await?;
        Ok(Self::new(pool, storage))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
