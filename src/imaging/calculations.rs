//! Pure calculation functions for canvas and draw dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Where and how large the source is drawn, and on what canvas.
///
/// Produced by [`plan_fit`]. Offsets place the drawn region inside the
/// canvas; `offset + draw <= canvas` holds on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub draw_width: u32,
    pub draw_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    /// True when the drawn region leaves part of the canvas uncovered.
    pub letterboxed: bool,
}

impl FitPlan {
    /// A plan where the drawn image covers the whole canvas.
    fn filling(width: u32, height: u32) -> Self {
        Self {
            canvas_width: width,
            canvas_height: height,
            draw_width: width,
            draw_height: height,
            offset_x: 0,
            offset_y: 0,
            letterboxed: false,
        }
    }

    /// Whether the canvas has no pixels at all.
    pub fn is_zero_area(&self) -> bool {
        self.canvas_width == 0 || self.canvas_height == 0
    }
}

/// Compute the canvas and draw rectangle for a source image.
///
/// Policies, in priority order:
///
/// 1. Both targets set: canvas is exactly `target_width × target_height`, the
///    source is scaled to fit inside it and centered (letterboxed).
/// 2. Only width: height follows the source aspect ratio.
/// 3. Only height: width follows the source aspect ratio.
/// 4. Neither: canvas is the source size (pure re-encode).
///
/// A target of `Some(0)` is treated as unset. Source dimensions must be
/// non-zero.
///
/// # Examples
/// ```
/// # use picsqueeze::imaging::plan_fit;
/// let plan = plan_fit((4000, 3000), Some(1080), Some(1080));
/// assert_eq!((plan.draw_width, plan.draw_height), (1080, 810));
/// assert_eq!((plan.offset_x, plan.offset_y), (0, 135));
/// ```
pub fn plan_fit(
    source: (u32, u32),
    target_width: Option<u32>,
    target_height: Option<u32>,
) -> FitPlan {
    let (src_w, src_h) = source;
    let src_aspect = src_w as f64 / src_h as f64;

    match (
        target_width.filter(|&w| w > 0),
        target_height.filter(|&h| h > 0),
    ) {
        (Some(tgt_w), Some(tgt_h)) => {
            let tgt_aspect = tgt_w as f64 / tgt_h as f64;

            let (draw_w, draw_h) = if src_aspect > tgt_aspect {
                // Source is relatively wider: width matches, bars top and bottom
                (tgt_w as f64, tgt_w as f64 / src_aspect)
            } else {
                // Source is relatively taller: height matches, bars left and right
                (tgt_h as f64 * src_aspect, tgt_h as f64)
            };

            let draw_width = (draw_w.round() as u32).clamp(1, tgt_w);
            let draw_height = (draw_h.round() as u32).clamp(1, tgt_h);

            FitPlan {
                canvas_width: tgt_w,
                canvas_height: tgt_h,
                draw_width,
                draw_height,
                offset_x: (tgt_w - draw_width) / 2,
                offset_y: (tgt_h - draw_height) / 2,
                letterboxed: draw_width != tgt_w || draw_height != tgt_h,
            }
        }
        (Some(tgt_w), None) => {
            let h = (tgt_w as f64 / src_aspect).round() as u32;
            FitPlan::filling(tgt_w, h)
        }
        (None, Some(tgt_h)) => {
            let w = (tgt_h as f64 * src_aspect).round() as u32;
            FitPlan::filling(w, tgt_h)
        }
        (None, None) => FitPlan::filling(src_w, src_h),
    }
}

/// Scale `(width, height)` down so the longer edge is at most `max_edge`.
///
/// Dimensions already within the bound are returned unchanged. Neither edge
/// drops below one pixel.
pub fn fit_within(dims: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (w, h) = dims;
    let longer = w.max(h);
    if longer <= max_edge || longer == 0 {
        return dims;
    }
    let ratio = max_edge as f64 / longer as f64;
    (
        ((w as f64 * ratio).round() as u32).max(1),
        ((h as f64 * ratio).round() as u32).max(1),
    )
}

/// Shrink both edges by `factor`, never below one pixel.
pub fn shrink_dimensions(dims: (u32, u32), factor: f64) -> (u32, u32) {
    let (w, h) = dims;
    (
        ((w as f64 * factor).round() as u32).max(1),
        ((h as f64 * factor).round() as u32).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // plan_fit: both targets (letterbox)
    // =========================================================================

    #[test]
    fn letterbox_landscape_into_square() {
        // 4000x3000 (1.333) into 1080x1080 (1.0): width matches, bars top/bottom
        let plan = plan_fit((4000, 3000), Some(1080), Some(1080));
        assert_eq!(
            plan,
            FitPlan {
                canvas_width: 1080,
                canvas_height: 1080,
                draw_width: 1080,
                draw_height: 810,
                offset_x: 0,
                offset_y: 135,
                letterboxed: true,
            }
        );
    }

    #[test]
    fn letterbox_portrait_into_landscape() {
        // 600x800 (0.75) into 1200x675 (1.78): height matches, bars left/right
        let plan = plan_fit((600, 800), Some(1200), Some(675));
        assert_eq!(plan.draw_height, 675);
        assert_eq!(plan.draw_width, 506); // 675 * 0.75 = 506.25
        assert_eq!(plan.offset_x, (1200 - 506) / 2);
        assert_eq!(plan.offset_y, 0);
        assert!(plan.letterboxed);
    }

    #[test]
    fn same_aspect_is_not_letterboxed() {
        let plan = plan_fit((2000, 1000), Some(1000), Some(500));
        assert_eq!((plan.draw_width, plan.draw_height), (1000, 500));
        assert_eq!((plan.offset_x, plan.offset_y), (0, 0));
        assert!(!plan.letterboxed);
    }

    #[test]
    fn extreme_aspect_keeps_at_least_one_pixel() {
        let plan = plan_fit((10_000, 1), Some(100), Some(100));
        assert_eq!(plan.draw_width, 100);
        assert_eq!(plan.draw_height, 1);
        assert_eq!(plan.offset_y, 49);
    }

    #[test]
    fn draw_rect_always_inside_canvas() {
        let sources = [(1, 1), (3, 7), (4000, 3000), (3000, 4000), (1920, 1080), (17, 999)];
        let targets = [(1, 1), (1080, 1080), (1080, 1920), (1200, 627), (5, 3000)];
        for &src in &sources {
            for &(tw, th) in &targets {
                let plan = plan_fit(src, Some(tw), Some(th));
                assert_eq!((plan.canvas_width, plan.canvas_height), (tw, th));
                assert!(plan.offset_x + plan.draw_width <= tw, "{src:?} -> {tw}x{th}");
                assert!(plan.offset_y + plan.draw_height <= th, "{src:?} -> {tw}x{th}");
                // Centered to within one pixel of rounding
                let right = tw - plan.offset_x - plan.draw_width;
                let bottom = th - plan.offset_y - plan.draw_height;
                assert!(right.abs_diff(plan.offset_x) <= 1);
                assert!(bottom.abs_diff(plan.offset_y) <= 1);
            }
        }
    }

    #[test]
    fn plan_is_deterministic() {
        let a = plan_fit((3024, 4032), Some(1200), Some(630));
        let b = plan_fit((3024, 4032), Some(1200), Some(630));
        assert_eq!(a, b);
    }

    // =========================================================================
    // plan_fit: single target / no target
    // =========================================================================

    #[test]
    fn width_only_derives_height() {
        // 800x600, width 400 → height round(400 / 1.333) = 300
        let plan = plan_fit((800, 600), Some(400), None);
        assert_eq!(plan, FitPlan::filling(400, 300));
    }

    #[test]
    fn height_only_derives_width() {
        // 800x600, height 300 → width round(300 * 1.333) = 400
        let plan = plan_fit((800, 600), None, Some(300));
        assert_eq!(plan, FitPlan::filling(400, 300));
    }

    #[test]
    fn zero_target_is_treated_as_unset() {
        assert_eq!(plan_fit((800, 600), Some(400), Some(0)), FitPlan::filling(400, 300));
        assert_eq!(plan_fit((800, 600), Some(0), Some(0)), FitPlan::filling(800, 600));
    }

    #[test]
    fn no_targets_keeps_source_size() {
        let plan = plan_fit((1234, 567), None, None);
        assert_eq!(plan, FitPlan::filling(1234, 567));
        assert!(!plan.letterboxed);
    }

    #[test]
    fn derived_zero_height_is_zero_area() {
        // 10000x1 at width 100 → height rounds to 0
        let plan = plan_fit((10_000, 1), Some(100), None);
        assert!(plan.is_zero_area());
    }

    // =========================================================================
    // fit_within / shrink_dimensions
    // =========================================================================

    #[test]
    fn fit_within_leaves_small_images_alone() {
        assert_eq!(fit_within((800, 600), 1080), (800, 600));
        assert_eq!(fit_within((1080, 1080), 1080), (1080, 1080));
    }

    #[test]
    fn fit_within_scales_longer_edge() {
        assert_eq!(fit_within((2000, 1000), 1000), (1000, 500));
        assert_eq!(fit_within((1000, 2000), 1000), (500, 1000));
    }

    #[test]
    fn shrink_never_reaches_zero() {
        assert_eq!(shrink_dimensions((1000, 500), 0.95), (950, 475));
        assert_eq!(shrink_dimensions((1, 1), 0.95), (1, 1));
    }
}
