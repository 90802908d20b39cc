//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` with sniffed format |
//! | Rasterize | `DynamicImage::resize_exact` (Lanczos3) + `imageops::overlay` on a solid canvas |
//! | Stage A | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | Stage B | decode → cap long edge → re-encode, shrinking 5% per pass until under the size cap |
//!
//! Output is always baseline JPEG regardless of input format. Transparent
//! pixels are flattened onto the background color, since JPEG has no alpha.

use super::backend::{BackendError, Compressed, ImageBackend};
use super::calculations::{FitPlan, fit_within, shrink_dimensions};
use super::params::{Background, CompressOptions, Quality, jpeg_quality};
use crate::interrupt::Interrupt;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageFormat, ImageReader, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Per-pass reduction applied to both dimensions and quality in Stage B.
const SHRINK_FACTOR: f64 = 0.95;

/// Largest RGBA canvas `rasterize` will allocate, matching the `image`
/// crate's default decode allocation limit.
pub const MAX_CANVAS_BYTES: u64 = 512 * 1024 * 1024;

const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// MIME type for a file extension, if it names a decodable image format.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    PHOTO_CANDIDATES
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
        .map(|(_, fmt)| fmt.to_mime_type())
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-step mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_jpeg(surface: &RgbImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return Err(BackendError::Encode(format!(
            "cannot encode a {width}x{height} canvas"
        )));
    }
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode(surface.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

/// Resample `base` to `dims`, or clone it when the size already matches.
fn render_at(base: &RgbImage, dims: (u32, u32)) -> RgbImage {
    if base.dimensions() == dims {
        base.clone()
    } else {
        image::imageops::resize(base, dims.0, dims.1, FilterType::Lanczos3)
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn rasterize(
        &self,
        source: &DynamicImage,
        plan: &FitPlan,
        background: Background,
    ) -> Result<RgbImage, BackendError> {
        if plan.is_zero_area() {
            return Err(BackendError::Encode(format!(
                "zero-area canvas {}x{}",
                plan.canvas_width, plan.canvas_height
            )));
        }

        let canvas_bytes = (plan.canvas_width as u64 * plan.canvas_height as u64)
            .checked_mul(4)
            .filter(|&n| n <= MAX_CANVAS_BYTES);
        if canvas_bytes.is_none() {
            return Err(BackendError::Encode(format!(
                "unsupported target size {}x{}",
                plan.canvas_width, plan.canvas_height
            )));
        }

        let [r, g, b] = background.0;
        let mut canvas =
            RgbaImage::from_pixel(plan.canvas_width, plan.canvas_height, Rgba([r, g, b, 255]));

        let drawn = if (source.width(), source.height()) == (plan.draw_width, plan.draw_height) {
            source.to_rgba8()
        } else {
            source
                .resize_exact(plan.draw_width, plan.draw_height, FilterType::Lanczos3)
                .to_rgba8()
        };
        image::imageops::overlay(
            &mut canvas,
            &drawn,
            plan.offset_x as i64,
            plan.offset_y as i64,
        );

        Ok(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }

    fn encode(&self, surface: &RgbImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        encode_jpeg(surface, jpeg_quality(quality.fraction()))
    }

    fn compress(
        &self,
        blob: &[u8],
        options: &CompressOptions,
        interrupt: &Interrupt,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Compressed, BackendError> {
        let base = self
            .decode(blob)
            .map_err(|e| BackendError::Encode(format!("stage A output unreadable: {e}")))?
            .to_rgb8();
        let original = base.dimensions();
        let mut dims = fit_within(original, options.max_dimension);
        let resized = dims != original;
        let mut quality = options.initial_quality;
        let total_steps = (options.max_iterations + 1) as f32;

        interrupt.check()?;
        let mut bytes = encode_jpeg(&render_at(&base, dims), jpeg_quality(quality))?;
        progress(1.0 / total_steps);

        let blob_fits = blob.len() as u64 <= options.max_size_bytes;
        if blob_fits && !resized && bytes.len() > blob.len() {
            debug!(
                stage_a = blob.len(),
                stage_b = bytes.len(),
                "re-encode grew the image, keeping stage A output"
            );
            progress(1.0);
            return Ok(Compressed {
                bytes: blob.to_vec(),
                width: original.0,
                height: original.1,
                quality,
                passes: 0,
            });
        }

        let mut passes = 0;
        while bytes.len() as u64 > options.max_size_bytes && passes < options.max_iterations {
            interrupt.check()?;
            dims = shrink_dimensions(dims, SHRINK_FACTOR);
            quality *= SHRINK_FACTOR as f32;
            bytes = encode_jpeg(&render_at(&base, dims), jpeg_quality(quality))?;
            passes += 1;
            debug!(pass = passes, size = bytes.len(), width = dims.0, height = dims.1, "stage B pass");
            progress((passes + 1) as f32 / total_steps);
        }

        if bytes.len() as u64 > options.max_size_bytes {
            warn!(
                limit = options.max_size_bytes,
                actual = bytes.len(),
                passes,
                "size cap not reached, keeping best effort"
            );
        }
        progress(1.0);

        Ok(Compressed {
            bytes,
            width: dims.0,
            height: dims.1,
            quality,
            passes,
        })
    }
}
