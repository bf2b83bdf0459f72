//! Centralized default constants for the catalog.
//!
//! Crates reference these instead of defining their own magic numbers.
//! Organized by domain area.

// =============================================================================
// PAGINATION
// =============================================================================

/// Fixed number of products per listing page.
pub const PRODUCTS_PER_PAGE: i64 = 4;

/// First page number (pages are one-based in URLs).
pub const FIRST_PAGE: i64 = 1;

// =============================================================================
// IMAGES
// =============================================================================

/// Position assigned to the first image of a product.
pub const FIRST_IMAGE_POSITION: i32 = 0;

/// Maximum size of a single uploaded image (10 MiB).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum stored length of an image display name.
pub const MAX_DISPLAY_NAME_LEN: usize = 255;

/// Width of thumbnails in the reorder widget, in pixels.
pub const THUMBNAIL_WIDTH: u32 = 150;

// =============================================================================
// PRODUCT FIELDS
// =============================================================================

/// Maximum length of a product name.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a product description.
pub const MAX_DESCRIPTION_LEN: usize = 10_000;

/// Maximum length of a listing text query.
pub const MAX_QUERY_LEN: usize = 200;

// =============================================================================
// DATABASE POOL
// =============================================================================

/// Default maximum number of pooled database connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Default wait for a free pooled connection, in seconds.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Idle pooled connections are closed after this many seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Pooled connections are recycled after this many seconds.
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Maximum request body size in bytes (64 MiB, several images per form).
pub const MAX_BODY_SIZE_BYTES: usize = 64 * 1024 * 1024;

/// Default root directory of the filesystem storage backend.
pub const FILE_STORAGE_PATH: &str = "/var/lib/catalog/files";

/// Default URL prefix under which stored images are served.
pub const PUBLIC_IMAGE_BASE_URL: &str = "/media";

/// Default UI locale.
pub const LOCALE: &str = "en";

/// Lifetime of the flash-message cookie, in seconds.
pub const FLASH_COOKIE_MAX_AGE_SECS: u64 = 60;
