//! Structured logging field names shared by every catalog crate.
//!
//! Log aggregation queries key on these names, so crates use the constants
//! rather than ad-hoc strings.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Request failed with a storage or transaction error |
//! | WARN  | Recoverable issue (orphaned file left behind, bad config value) |
//! | INFO  | Lifecycle events (startup, shutdown), saved/deleted products |
//! | DEBUG | Decision points: reconciliation counts, validation outcomes |
//! | TRACE | Per-image iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "storage", "lifecycle"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "products", "product_images", "pool", "file_storage"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create", "update", "delete", "reconcile", "attach_new"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Product UUID being operated on.
pub const PRODUCT_ID: &str = "product_id";

/// Product image UUID being operated on.
pub const IMAGE_ID: &str = "image_id";

/// Storage path of a file in the storage backend.
pub const STORAGE_PATH: &str = "storage_path";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of images in the resulting collection.
pub const IMAGE_COUNT: &str = "image_count";

/// Number of images kept by a reconciliation.
pub const KEPT_COUNT: &str = "kept_count";

/// Number of images marked for removal by a reconciliation.
pub const REMOVED_COUNT: &str = "removed_count";

/// Number of newly attached images.
pub const ADDED_COUNT: &str = "added_count";

/// Number of rows returned by a listing query.
pub const RESULT_COUNT: &str = "result_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
