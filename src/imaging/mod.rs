//! Image processing: pure Rust, no system libraries.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from bytes) |
//! | **Fit** | [`plan_fit`]: pure dimension math |
//! | **Rasterize** | Lanczos3 resize onto a white canvas |
//! | **Stage A** | JPEG at the requested quality |
//! | **Stage B** | size-capped iterative re-encode |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Compressed, ImageBackend};
pub use calculations::{FitPlan, fit_within, plan_fit, shrink_dimensions};
pub use operations::process_image;
pub use params::{
    Background, CompressOptions, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_SIZE_BYTES, MAX_QUALITY,
    MIN_QUALITY, Quality, ResizeParams,
};
pub use rust_backend::RustBackend;
