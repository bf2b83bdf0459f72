//! Core data models for the product catalog.
//!
//! These types are shared across all catalog crates and represent the
//! domain entities: products and the ordered images they own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// PRODUCT TYPES
// =============================================================================

/// A catalog product (the parent record of an image collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Price in minor currency units (cents).
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Descriptive fields of a product as bound from a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
}

/// A product together with its images, ordered by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductWithImages {
    pub product: Product,
    pub images: Vec<ProductImage>,
}

impl ProductWithImages {
    /// Identifiers of the images in position order.
    pub fn image_ids(&self) -> Vec<Uuid> {
        self.images.iter().map(|i| i.id).collect()
    }
}

/// Listing row: product fields plus its cover image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub image_count: i64,
    /// Public URL of the image at position 0, if any.
    pub cover_url: Option<String>,
}

// =============================================================================
// IMAGE TYPES
// =============================================================================

/// One persisted image attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Backend-relative location of the stored bytes.
    pub storage_path: String,
    /// URL under which the image is publicly served.
    pub public_url: String,
    pub display_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
    /// BLAKE3 hash of the stored bytes (`blake3:{hex}`).
    pub content_hash: String,
    /// Zero-based, contiguous within the owning product.
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// A file as submitted through the multipart upload field.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub filename: String,
    /// MIME type claimed by the client; never trusted on its own.
    pub claimed_type: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, claimed_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            claimed_type: claimed_type.into(),
            data,
        }
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("filename", &self.filename)
            .field("claimed_type", &self.claimed_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// An upload that passed image validation.
///
/// Only [`crate::image_validation::validate_image`] constructs this type, so
/// holding one proves the bytes decode as a supported image.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatedImage {
    pub(crate) display_name: String,
    pub(crate) content_type: String,
    pub(crate) extension: &'static str,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: Vec<u8>,
}

impl ValidatedImage {
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// MIME type detected from magic bytes.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Canonical file extension for the detected format (without dot).
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size_bytes(&self) -> i64 {
        self.data.len() as i64
    }
}

impl std::fmt::Debug for ValidatedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedImage")
            .field("display_name", &self.display_name)
            .field("content_type", &self.content_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Where a stored file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub storage_path: String,
    pub public_url: String,
    pub content_hash: String,
}

// =============================================================================
// PRICE FORMATTING
// =============================================================================

/// Parse a decimal price such as `"12"`, `"12.5"` or `"12,50"` into cents.
///
/// Returns `None` for negative, malformed, or over-precise values.
pub fn parse_price_cents(input: &str) -> Option<i64> {
    let normalized = input.trim().replace(',', ".");
    if normalized.is_empty() || normalized.starts_with('-') || normalized.starts_with('+') {
        return None;
    }

    let (whole, frac) = match normalized.split_once('.') {
        Some((w, f)) => (w, f),
        None => (normalized.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(frac)
}

/// Format cents as a decimal string with two fraction digits.
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
