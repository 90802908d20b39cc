//! Shared test utilities: synthetic images and source builders.
//!
//! Everything is generated in memory with the `image` crate so tests never
//! depend on fixture files.

use crate::types::{ImageId, SourceImage};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

// =========================================================================
// Pixels
// =========================================================================

/// Deterministic high-frequency pattern; compresses poorly, like a photo.
pub fn noisy_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v = x.wrapping_mul(7919) ^ y.wrapping_mul(104_729) ^ x.wrapping_mul(y);
        image::Rgb([(v % 251) as u8, (v / 7 % 253) as u8, (v / 13 % 241) as u8])
    })
}

/// Encoded JPEG of [`noisy_image`].
pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let img = noisy_image(width, height);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encoded PNG with a uniform red color at the given alpha.
pub fn png_rgba_bytes(width: u32, height: u32, alpha: u8) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, image::Rgba([200, 0, 0, alpha]));
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
        .unwrap();
    buf
}

// =========================================================================
// Sources
// =========================================================================

/// A JPEG source with id `id` and name `<id>.jpg`.
pub fn jpeg_source(id: &str, width: u32, height: u32) -> SourceImage {
    SourceImage::new(
        ImageId::new(id),
        format!("{id}.jpg"),
        "image/jpeg",
        jpeg_bytes(width, height, 92),
    )
}

/// A source that claims to be a JPEG but holds garbage.
pub fn corrupt_source(id: &str) -> SourceImage {
    SourceImage::new(
        ImageId::new(id),
        format!("{id}.jpg"),
        "image/jpeg",
        b"corrupt: not really a jpeg".to_vec(),
    )
}
