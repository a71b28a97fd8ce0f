//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Dimensions are `(width, height)` tuples; a zero in either position means
//! "no pixels" and every function degrades to an empty result for it.

use super::params::{FitMode, ResizeOptions};

/// Width divided by height, or `0.0` for a zero-height image.
pub fn aspect_ratio(dims: (u32, u32)) -> f64 {
    let (w, h) = dims;
    if h == 0 { 0.0 } else { w as f64 / h as f64 }
}

fn scaled(value: u32, factor: f64) -> u32 {
    ((value as f64 * factor).round() as u32).max(1)
}

/// Calculate the output dimensions for a resize.
///
/// Resolution order:
/// 1. Start from explicit `width`/`height`, falling back to the natural size.
/// 2. With `maintain_aspect_ratio`, a single explicit dimension derives the
///    other from the source ratio.
/// 3. `max_width`/`max_height` shrink the result. With `maintain_aspect_ratio`
///    both edges scale by the same factor; without it each edge is clamped
///    independently.
///
/// # Examples
/// ```
/// # use exportkit::imaging::{calculate_target_dimensions, ResizeOptions};
/// // 1000x500 bounded to 200x200 → 200x100
/// let opts = ResizeOptions::bounded(200, 200);
/// assert_eq!(calculate_target_dimensions((1000, 500), &opts), (200, 100));
/// ```
pub fn calculate_target_dimensions(natural: (u32, u32), options: &ResizeOptions) -> (u32, u32) {
    let (nat_w, nat_h) = natural;
    if nat_w == 0 || nat_h == 0 {
        return (options.width.unwrap_or(0), options.height.unwrap_or(0));
    }
    let ratio = aspect_ratio(natural);

    let (mut w, mut h) = match (options.width, options.height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) if options.maintain_aspect_ratio => (w, scaled(w, 1.0 / ratio)),
        (None, Some(h)) if options.maintain_aspect_ratio => (scaled(h, ratio), h),
        (w, h) => (w.unwrap_or(nat_w), h.unwrap_or(nat_h)),
    };

    if options.maintain_aspect_ratio {
        let mut factor: f64 = 1.0;
        if let Some(max_w) = options.max_width
            && w > max_w
        {
            factor = factor.min(max_w as f64 / w as f64);
        }
        if let Some(max_h) = options.max_height
            && h > max_h
        {
            factor = factor.min(max_h as f64 / h as f64);
        }
        if factor < 1.0 {
            w = scaled(w, factor);
            h = scaled(h, factor);
        }
    } else {
        if let Some(max_w) = options.max_width {
            w = w.min(max_w);
        }
        if let Some(max_h) = options.max_height {
            h = h.min(max_h);
        }
    }

    (w, h)
}

/// Where a scaled source lands on a target canvas.
///
/// `x`/`y` can be negative for [`FitMode::Cover`], where the overflow is
/// cropped evenly off both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// True if the placed image lies entirely inside a `target` canvas.
    pub fn fits_within(&self, target: (u32, u32)) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + self.width as i64 <= target.0 as i64
            && self.y + self.height as i64 <= target.1 as i64
    }
}

/// Calculate where a `natural`-sized source is drawn on a `target` canvas.
///
/// - `Contain`: largest uniform scale that fits, centered. Never exceeds the
///   target on either axis.
/// - `Cover`: smallest uniform scale that covers, centered. At least one axis
///   overflows and gets cropped.
/// - `Fill`: the whole canvas, ignoring aspect ratio.
pub fn calculate_placement(natural: (u32, u32), target: (u32, u32), fit: FitMode) -> Placement {
    let (nat_w, nat_h) = natural;
    let (tgt_w, tgt_h) = target;

    if nat_w == 0 || nat_h == 0 || tgt_w == 0 || tgt_h == 0 {
        return Placement {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    }

    let scale_x = tgt_w as f64 / nat_w as f64;
    let scale_y = tgt_h as f64 / nat_h as f64;

    match fit {
        FitMode::Fill => Placement {
            x: 0,
            y: 0,
            width: tgt_w,
            height: tgt_h,
        },
        FitMode::Contain => {
            let scale = scale_x.min(scale_y);
            let width = scaled(nat_w, scale).min(tgt_w);
            let height = scaled(nat_h, scale).min(tgt_h);
            Placement {
                x: ((tgt_w - width) / 2) as i64,
                y: ((tgt_h - height) / 2) as i64,
                width,
                height,
            }
        }
        FitMode::Cover => {
            let scale = scale_x.max(scale_y);
            let width = scaled(nat_w, scale).max(tgt_w);
            let height = scaled(nat_h, scale).max(tgt_h);
            Placement {
                x: -(((width - tgt_w) / 2) as i64),
                y: -(((height - tgt_h) / 2) as i64),
                width,
                height,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ResizeOptions {
        ResizeOptions::default()
    }

    // =========================================================================
    // aspect_ratio
    // =========================================================================

    #[test]
    fn aspect_ratio_landscape_and_portrait() {
        assert_eq!(aspect_ratio((300, 150)), 2.0);
        assert_eq!(aspect_ratio((150, 300)), 0.5);
    }

    #[test]
    fn aspect_ratio_zero_height() {
        assert_eq!(aspect_ratio((100, 0)), 0.0);
    }

    // =========================================================================
    // calculate_target_dimensions
    // =========================================================================

    #[test]
    fn no_constraints_keeps_natural_size() {
        assert_eq!(calculate_target_dimensions((640, 480), &opts()), (640, 480));
    }

    #[test]
    fn width_only_derives_height() {
        let o = ResizeOptions {
            width: Some(320),
            ..opts()
        };
        assert_eq!(calculate_target_dimensions((640, 480), &o), (320, 240));
    }

    #[test]
    fn height_only_derives_width() {
        let o = ResizeOptions {
            height: Some(100),
            ..opts()
        };
        assert_eq!(calculate_target_dimensions((400, 200), &o), (200, 100));
    }

    #[test]
    fn width_only_without_aspect_keeps_natural_height() {
        let o = ResizeOptions {
            width: Some(320),
            maintain_aspect_ratio: false,
            ..opts()
        };
        assert_eq!(calculate_target_dimensions((640, 480), &o), (320, 480));
    }

    #[test]
    fn max_bounds_shrink_uniformly() {
        let o = ResizeOptions::bounded(200, 200);
        assert_eq!(calculate_target_dimensions((1000, 500), &o), (200, 100));
        assert_eq!(calculate_target_dimensions((500, 1000), &o), (100, 200));
    }

    #[test]
    fn max_bounds_never_enlarge() {
        let o = ResizeOptions::bounded(2000, 2000);
        assert_eq!(calculate_target_dimensions((300, 200), &o), (300, 200));
    }

    #[test]
    fn max_bounds_without_aspect_clamp_each_axis() {
        let o = ResizeOptions {
            max_width: Some(100),
            max_height: Some(400),
            maintain_aspect_ratio: false,
            ..opts()
        };
        assert_eq!(calculate_target_dimensions((300, 300), &o), (100, 300));
    }

    #[test]
    fn tiny_results_never_reach_zero() {
        let o = ResizeOptions::bounded(10, 10);
        assert_eq!(calculate_target_dimensions((10000, 1), &o), (10, 1));
    }

    #[test]
    fn zero_natural_dimensions_use_explicit_box() {
        let o = ResizeOptions::exact(50, 40, FitMode::Contain);
        assert_eq!(calculate_target_dimensions((0, 0), &o), (50, 40));
        assert_eq!(calculate_target_dimensions((0, 10), &opts()), (0, 0));
    }

    // =========================================================================
    // calculate_placement
    // =========================================================================

    #[test]
    fn contain_letterboxes_wide_source() {
        let p = calculate_placement((300, 100), (150, 50), FitMode::Contain);
        assert_eq!(
            p,
            Placement {
                x: 0,
                y: 0,
                width: 150,
                height: 50
            }
        );

        let p = calculate_placement((400, 100), (150, 50), FitMode::Contain);
        assert_eq!((p.width, p.height), (150, 38));
        assert_eq!(p.x, 0);
        assert_eq!(p.y, 6);
    }

    #[test]
    fn contain_pillarboxes_tall_source() {
        let p = calculate_placement((100, 200), (150, 50), FitMode::Contain);
        assert_eq!((p.width, p.height), (25, 50));
        assert_eq!(p.x, 62);
        assert_eq!(p.y, 0);
    }

    #[test]
    fn contain_always_fits() {
        for natural in [(1, 1), (7, 3), (3, 7), (1000, 999), (1, 5000)] {
            for target in [(150, 50), (1, 1), (33, 77)] {
                let p = calculate_placement(natural, target, FitMode::Contain);
                assert!(p.fits_within(target), "{natural:?} in {target:?}: {p:?}");
            }
        }
    }

    #[test]
    fn contain_preserves_aspect_within_rounding() {
        let natural = (640, 480);
        let p = calculate_placement(natural, (200, 200), FitMode::Contain);
        let diff = (aspect_ratio((p.width, p.height)) - aspect_ratio(natural)).abs();
        assert!(diff < 0.02, "aspect drift {diff}");
    }

    #[test]
    fn cover_overflows_and_centers() {
        let p = calculate_placement((200, 100), (100, 100), FitMode::Cover);
        assert_eq!((p.width, p.height), (200, 100));
        assert_eq!(p.x, -50);
        assert_eq!(p.y, 0);
    }

    #[test]
    fn cover_always_covers() {
        for natural in [(1, 1), (7, 3), (3, 7), (1000, 999)] {
            let target = (150, 50);
            let p = calculate_placement(natural, target, FitMode::Cover);
            assert!(p.width >= target.0 && p.height >= target.1);
            assert!(p.x <= 0 && p.y <= 0);
        }
    }

    #[test]
    fn fill_uses_whole_canvas() {
        let p = calculate_placement((17, 900), (150, 50), FitMode::Fill);
        assert_eq!(
            p,
            Placement {
                x: 0,
                y: 0,
                width: 150,
                height: 50
            }
        );
    }

    #[test]
    fn empty_inputs_place_nothing() {
        let p = calculate_placement((0, 10), (150, 50), FitMode::Contain);
        assert_eq!((p.width, p.height), (0, 0));
        let p = calculate_placement((10, 10), (0, 50), FitMode::Cover);
        assert_eq!((p.width, p.height), (0, 0));
    }
}
