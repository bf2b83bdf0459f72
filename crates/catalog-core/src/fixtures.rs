//! Encoded image fixtures for tests.
//!
//! Always compiled so integration tests in other crates can build real
//! uploads without checking binary files into the repository.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 40 % 256) as u8, (y * 40 % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("in-memory image encoding cannot fail");
    buf
}

/// A PNG of the given size.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// A baseline JPEG of the given size.
pub fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// A single-frame GIF of the given size.
pub fn sample_gif(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Gif)
}
