//! # catalog-core
//!
//! Core types, image lifecycle rules, and abstractions for the product catalog.
//!
//! This crate holds everything that does not need a database or an HTTP
//! stack: domain models, validation of uploaded images, reconciliation of a
//! product's image set, the reorder widget state, and the repository traits
//! implemented by `catalog-db`.

pub mod defaults;
pub mod error;
pub mod fixtures;
pub mod image_validation;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod reconcile;
pub mod reorder;
pub mod search;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result, ValidationError};
pub use image_validation::{detect_image_format, sanitize_filename, validate_image};
pub use lifecycle::{
    ImageDraft, ImageLifecycleManager, ImagePlan, PlannedImage, PositionUpdate,
};
pub use models::*;
pub use reconcile::{reconcile_order, Reconciliation};
pub use reorder::{hidden_field_name, ReorderItem, ReorderList};
pub use search::*;
pub use traits::*;
