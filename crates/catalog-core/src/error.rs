//! Error types for the product catalog.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using the catalog's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// User-correctable problems with a product's image set.
///
/// The form is re-rendered with the error and the in-progress state, and
/// nothing is persisted. Only `ImagesChanged` is raised by the storage layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One of the submitted files does not decode as a supported image.
    #[error("File '{filename}' is not a supported image")]
    NotAnImage { filename: String },

    /// One of the submitted files exceeds the per-file size limit.
    #[error("File '{filename}' exceeds the maximum size of {max_bytes} bytes")]
    TooLarge { filename: String, max_bytes: usize },

    /// The resulting image collection would be empty.
    #[error("A product needs at least one image")]
    NoImages,

    /// The submitted order references an image that does not belong to the product.
    #[error("Image {0} does not belong to this product")]
    UnknownImage(Uuid),

    /// The submitted order lists the same image more than once.
    #[error("Image {0} was submitted more than once")]
    DuplicateImage(Uuid),

    /// Another edit changed the product's images after this form was loaded.
    #[error("Images of product {0} changed since the form was loaded")]
    ImagesChanged(Uuid),
}

impl ValidationError {
    /// Translation key of the user-facing message for this error.
    pub fn message_id(&self) -> &'static str {
        match self {
            Self::NotAnImage { .. } => "one_of_the_files_is_not_an_image",
            Self::TooLarge { .. } => "one_of_the_files_is_too_large",
            Self::NoImages => "you_have_not_added_an_image",
            Self::UnknownImage(_) | Self::DuplicateImage(_) | Self::ImagesChanged(_) => {
                "the_image_order_is_invalid"
            }
        }
    }
}

/// Core error type for catalog operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// Product image not found
    #[error("Product image not found: {0}")]
    ImageNotFound(Uuid),

    /// Image set validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File storage backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
