//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take parameters, compute the fit, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{FitPlan, plan_fit};
use super::params::{Background, CompressOptions, ResizeParams};
use crate::interrupt::Interrupt;
use crate::naming;
use crate::types::{ProcessedImage, SizeShortfall, SourceImage};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Plan the canvas for a source of the given size.
pub fn plan_resize(source_dims: (u32, u32), params: &ResizeParams) -> FitPlan {
    plan_fit(source_dims, params.target_width, params.target_height)
}

/// Stage B limits for a planned canvas.
///
/// The long-edge cap equals the canvas long edge, so Stage B only shrinks
/// when it has to meet the size cap.
pub fn plan_compression(plan: &FitPlan, params: &ResizeParams) -> CompressOptions {
    CompressOptions {
        max_size_bytes: params.max_size_bytes,
        max_dimension: plan.canvas_width.max(plan.canvas_height),
        initial_quality: params.quality.fraction(),
        max_iterations: params.max_iterations,
    }
}

/// Run one source image through fit → rasterize → Stage A → Stage B.
///
/// `progress` receives Stage B's fractional progress. Nothing is retried;
/// the first error ends the item.
pub fn process_image(
    backend: &impl ImageBackend,
    source: &SourceImage,
    params: &ResizeParams,
    interrupt: &Interrupt,
    progress: &mut dyn FnMut(f32),
) -> Result<ProcessedImage> {
    if !source.claims_image() {
        return Err(BackendError::Decode(format!(
            "unsupported type '{}'",
            source.mime_type()
        )));
    }
    interrupt.check()?;

    // The decoded raster is dropped at the end of this block, on success or error.
    let (plan, surface) = {
        let decoded = backend.decode(source.bytes())?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(BackendError::Decode("image has no pixels".into()));
        }
        let plan = plan_resize((decoded.width(), decoded.height()), params);
        let surface = backend.rasterize(&decoded, &plan, Background::WHITE)?;
        (plan, surface)
    };
    interrupt.check()?;

    let blob = backend.encode(&surface, params.quality)?;
    drop(surface);

    let options = plan_compression(&plan, params);
    let compressed = backend.compress(&blob, &options, interrupt, progress)?;

    let actual = compressed.bytes.len() as u64;
    let shortfall = (actual > options.max_size_bytes).then_some(SizeShortfall {
        limit: options.max_size_bytes,
        actual,
    });

    Ok(ProcessedImage {
        output_name: naming::output_name(source.display_name()),
        bytes: compressed.bytes,
        width: compressed.width,
        height: compressed.height,
        quality: params.quality,
        original_size: source.byte_size(),
        shortfall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::interrupt::{CancelToken, Interrupted};
    use crate::test_helpers::{corrupt_source, jpeg_source};
    use crate::types::{ImageId, SourceImage};

    fn square(quality: u32) -> ResizeParams {
        ResizeParams {
            target_width: Some(1080),
            target_height: Some(1080),
            quality: Quality::new(quality),
            ..Default::default()
        }
    }

    fn run(backend: &impl ImageBackend, source: &SourceImage, params: &ResizeParams) -> Result<ProcessedImage> {
        process_image(backend, source, params, &Interrupt::never(), &mut |_: f32| {})
    }

    // =========================================================================
    // Planning (no backend)
    // =========================================================================

    #[test]
    fn compression_caps_at_canvas_long_edge() {
        let params = ResizeParams {
            target_width: Some(1080),
            target_height: Some(1920),
            quality: Quality::new(80),
            max_size_bytes: 5_000,
            max_iterations: 3,
        };
        let plan = plan_resize((4000, 3000), &params);
        let opts = plan_compression(&plan, &params);
        assert_eq!(opts.max_dimension, 1920);
        assert_eq!(opts.initial_quality, 0.8);
        assert_eq!(opts.max_size_bytes, 5_000);
        assert_eq!(opts.max_iterations, 3);
    }

    // =========================================================================
    // Mock backend
    // =========================================================================

    #[test]
    fn steps_run_in_order_with_planned_values() {
        let backend = MockBackend::new();
        let source = jpeg_source("a", 8, 8);
        let out = run(&backend, &source, &square(90)).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 4);
        assert!(matches!(ops[0], RecordedOp::Decode { .. }));
        // Mock decodes to 40x30 → letterboxed into 1080x1080
        assert!(matches!(
            &ops[1],
            RecordedOp::Rasterize { plan } if plan.draw_height == 810 && plan.offset_y == 135
        ));
        assert!(matches!(
            ops[2],
            RecordedOp::Encode {
                width: 1080,
                height: 1080,
                quality: 90
            }
        ));
        assert!(matches!(
            ops[3],
            RecordedOp::Compress {
                max_dimension: 1080,
                ..
            }
        ));
        assert_eq!((out.width, out.height), (1080, 1080));
        assert_eq!(out.quality.value(), 90);
        assert_eq!(out.output_name, "processed_a.jpg");
        assert_eq!(out.original_size, source.byte_size());
    }

    #[test]
    fn original_size_uses_declared_size() {
        let backend = MockBackend::new();
        let source = jpeg_source("a", 8, 8).with_declared_size(123_456);
        let out = run(&backend, &source, &square(85)).unwrap();
        assert_eq!(out.original_size, 123_456);
    }

    #[test]
    fn non_image_mime_fails_before_decoding() {
        let backend = MockBackend::new();
        let source = SourceImage::new(ImageId::new("d"), "doc.pdf", "application/pdf", vec![1, 2]);
        let result = run(&backend, &source, &square(85));
        assert!(matches!(result, Err(BackendError::Decode(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn decode_failure_stops_pipeline() {
        let backend = MockBackend::new();
        let result = run(&backend, &corrupt_source("c"), &square(85));
        assert!(matches!(result, Err(BackendError::Decode(_))));
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn oversized_output_records_shortfall() {
        let backend = MockBackend::with_compress_padding(500);
        let params = ResizeParams {
            max_size_bytes: 100,
            ..square(85)
        };
        let out = run(&backend, &jpeg_source("a", 8, 8), &params).unwrap();
        let shortfall = out.shortfall.expect("shortfall recorded");
        assert_eq!(shortfall.limit, 100);
        assert_eq!(shortfall.actual, out.encoded_size());
    }

    #[test]
    fn output_within_cap_has_no_shortfall() {
        let backend = MockBackend::new();
        let out = run(&backend, &jpeg_source("a", 8, 8), &square(85)).unwrap();
        assert!(out.shortfall.is_none());
    }

    #[test]
    fn cancelled_before_start_does_no_work() {
        let backend = MockBackend::new();
        let token = CancelToken::new();
        token.cancel();
        let result = process_image(
            &backend,
            &jpeg_source("a", 8, 8),
            &square(85),
            &Interrupt::start(&token, None),
            &mut |_: f32| {},
        );
        assert!(matches!(
            result,
            Err(BackendError::Interrupted(Interrupted::Cancelled))
        ));
        assert!(backend.get_operations().is_empty());
    }

    // =========================================================================
    // Real backend
    // =========================================================================

    #[test]
    fn real_backend_letterboxes_to_exact_canvas() {
        let backend = RustBackend::new();
        let source = jpeg_source("photo", 400, 300);
        let out = run(&backend, &source, &square(85)).unwrap();
        assert_eq!((out.width, out.height), (1080, 1080));
        let decoded = backend.decode(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1080, 1080));
    }

    #[test]
    fn real_backend_width_only_keeps_aspect() {
        let backend = RustBackend::new();
        let params = ResizeParams {
            target_width: Some(400),
            ..Default::default()
        };
        let out = run(&backend, &jpeg_source("p", 800, 600), &params).unwrap();
        assert_eq!((out.width, out.height), (400, 300));
    }

    #[test]
    fn real_backend_reencodes_png_as_jpeg() {
        let backend = RustBackend::new();
        let source = SourceImage::new(
            ImageId::new("png"),
            "logo.png",
            "image/png",
            crate::test_helpers::png_rgba_bytes(50, 40, 128),
        );
        let out = run(&backend, &source, &ResizeParams::default()).unwrap();
        assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!((out.width, out.height), (50, 40));
        assert_eq!(out.output_name, "processed_logo.jpg");
    }
}
