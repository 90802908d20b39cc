//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! and the [`backend`](super::backend) that does the pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (60–100, default 85). Clamped on construction.
//! - [`Background`]: Solid fill behind the drawn image (white).
//! - [`CompressOptions`]: Stage B limits: size cap, long-edge cap, starting quality, pass budget.
//! - [`ResizeParams`]: Everything one item needs: target box, quality, Stage B size limits.

use serde::Serialize;

/// Lowest quality the settings boundary accepts.
pub const MIN_QUALITY: u32 = 60;
/// Highest quality the settings boundary accepts.
pub const MAX_QUALITY: u32 = 100;

/// Default Stage B size cap: 10 MB.
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;
/// Default number of Stage B shrink passes.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Quality setting for lossy encoding, as a percentage (60-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(MIN_QUALITY, MAX_QUALITY))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as a fraction in `[0.6, 1.0]`.
    pub fn fraction(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Solid RGB fill used behind the drawn image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background(pub [u8; 3]);

impl Background {
    pub const WHITE: Self = Self([255, 255, 255]);
}

impl Default for Background {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Limits for the size-capped Stage B compressor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    /// Hard upper bound on output size in bytes.
    pub max_size_bytes: u64,
    /// Longest edge allowed in the output.
    pub max_dimension: u32,
    /// Starting quality as a fraction in `(0, 1]`.
    pub initial_quality: f32,
    /// Shrink passes attempted after the first encode.
    pub max_iterations: u32,
}

impl CompressOptions {
    pub fn new(max_size_bytes: u64, max_dimension: u32, initial_quality: f32) -> Self {
        Self {
            max_size_bytes,
            max_dimension,
            initial_quality,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Everything needed to process one image.
///
/// A target of `None` (or `Some(0)`) means "derive from the aspect ratio";
/// both `None` keeps the source size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeParams {
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub quality: Quality,
    pub max_size_bytes: u64,
    pub max_iterations: u32,
}

impl Default for ResizeParams {
    fn default() -> Self {
        Self {
            target_width: None,
            target_height: None,
            quality: Quality::default(),
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Convert a fractional quality to the integer scale JPEG encoders take.
pub fn jpeg_quality(fraction: f32) -> u8 {
    (fraction * 100.0).round().clamp(1.0, 100.0) as u8
}
