//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four steps every backend must
//! support: decode, rasterize, encode (Stage A) and compress (Stage B).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, built on the
//! `image` crate. Tests swap in the mock from this module's test submodule.

use super::calculations::FitPlan;
use super::params::{Background, CompressOptions, Quality};
use crate::interrupt::{Interrupt, Interrupted};
use image::{DynamicImage, RgbImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    /// Input bytes are not a decodable raster.
    #[error("Decode failed: {0}")]
    Decode(String),
    /// Codec serialization failed (zero-area canvas, encoder error).
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// Output of the size-capped Stage B compressor.
#[derive(Debug, Clone, PartialEq)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    /// Dimensions actually encoded; authoritative over Stage A's.
    pub width: u32,
    pub height: u32,
    /// Quality fraction of the final pass.
    pub quality: f32,
    /// Shrink passes run after the first encode.
    pub passes: u32,
}

/// Trait for image processing backends.
///
/// Every backend must implement all four steps so the rest of the codebase is
/// backend-agnostic. Implementations must not retry on failure.
pub trait ImageBackend: Sync {
    /// Decode raw input bytes into a raster.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Draw `source` onto a fresh canvas according to `plan`.
    fn rasterize(
        &self,
        source: &DynamicImage,
        plan: &FitPlan,
        background: Background,
    ) -> Result<RgbImage, BackendError>;

    /// Stage A: serialize the canvas at `quality`.
    fn encode(&self, surface: &RgbImage, quality: Quality) -> Result<Vec<u8>, BackendError>;

    /// Stage B: re-compress `blob` under the limits in `options`.
    ///
    /// `progress` receives fractions in `[0, 1]` as passes complete.
    fn compress(
        &self,
        blob: &[u8],
        options: &CompressOptions,
        interrupt: &Interrupt,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Compressed, BackendError>;
}
