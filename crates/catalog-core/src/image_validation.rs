//! Upload validation for product images.
//!
//! An upload is accepted only when:
//! 1. it is within the per-file size limit,
//! 2. its magic bytes identify a supported raster format (the claimed MIME
//!    type and the extension are ignored), and
//! 3. the image header decodes to non-zero dimensions.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use tracing::debug;

use crate::error::ValidationError;
use crate::models::{ImageUpload, ValidatedImage};

/// Formats accepted for product images: (MIME type, extension, decoder format).
pub const SUPPORTED_FORMATS: &[(&str, &str, ImageFormat)] = &[
    ("image/png", "png", ImageFormat::Png),
    ("image/jpeg", "jpg", ImageFormat::Jpeg),
    ("image/gif", "gif", ImageFormat::Gif),
    ("image/webp", "webp", ImageFormat::WebP),
    ("image/bmp", "bmp", ImageFormat::Bmp),
];

/// Detect a supported image format from magic bytes.
///
/// Returns `(mime_type, extension, format)` or `None` when the bytes are not
/// one of [`SUPPORTED_FORMATS`].
pub fn detect_image_format(data: &[u8]) -> Option<(&'static str, &'static str, ImageFormat)> {
    let kind = infer::get(data)?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return None;
    }
    SUPPORTED_FORMATS
        .iter()
        .find(|(mime, _, _)| *mime == kind.mime_type())
        .copied()
}

/// Validate an upload and turn it into a [`ValidatedImage`].
pub fn validate_image(
    upload: ImageUpload,
    max_size_bytes: usize,
) -> Result<ValidatedImage, ValidationError> {
    let ImageUpload {
        filename,
        claimed_type,
        data,
    } = upload;

    if data.len() > max_size_bytes {
        return Err(ValidationError::TooLarge {
            filename,
            max_bytes: max_size_bytes,
        });
    }

    let Some((mime, extension, format)) = detect_image_format(&data) else {
        debug!(
            subsystem = "lifecycle",
            component = "image_validation",
            filename = %filename,
            claimed_type = %claimed_type,
            "Rejected upload: magic bytes are not a supported image format"
        );
        return Err(ValidationError::NotAnImage { filename });
    };

    let (width, height) = match ImageReader::with_format(Cursor::new(&data), format).into_dimensions()
    {
        Ok((w, h)) if w > 0 && h > 0 => (w, h),
        Ok(_) | Err(_) => {
            debug!(
                subsystem = "lifecycle",
                component = "image_validation",
                filename = %filename,
                detected_type = mime,
                "Rejected upload: image header does not decode"
            );
            return Err(ValidationError::NotAnImage { filename });
        }
    };

    Ok(ValidatedImage {
        display_name: sanitize_filename(&filename),
        content_type: mime.to_string(),
        extension,
        width,
        height,
        data,
    })
}

/// Sanitize a client-supplied filename into a safe display name.
pub fn sanitize_filename(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed_image".to_string();
    }

    let max = crate::defaults::MAX_DISPLAY_NAME_LEN;
    if sanitized.len() > max {
        // Truncate on a char boundary, preserving the extension
        let ext = sanitized
            .rfind('.')
            .map(|pos| &sanitized[pos..])
            .filter(|ext| ext.len() < 16)
            .unwrap_or("");
        let mut cut = max - ext.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        return format!("{}{}", &sanitized[..cut], ext);
    }

    sanitized.to_string()
}
