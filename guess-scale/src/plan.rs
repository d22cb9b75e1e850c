// SPDX-License-Identifier: MIT
//! # Resize Specifications and Plan Computation
//!
//! Converts what a caller asked for (a ratio, or a target pixel width) into
//! the exact output canvas the scaler will fill.
//!
//! ## Rules
//!
//! - A width is converted into the equivalent ratio relative to the source
//!   width, then handled exactly like a ratio request. Height therefore scales
//!   by the same factor as width instead of being computed independently.
//! - Each axis is `round(ratio * side)`, clamped to a minimum of 1px.
//! - Ratios must be finite and strictly positive. Values above 1.0 are
//!   accepted here; bounding them is the caller's job.

use crate::cpu::ScaleError;

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// What a single resize request asks for. Exactly one form is supplied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResizeSpec {
    /// Uniform scale factor applied to both axes.
    Ratio(f64),
    /// Target output width in pixels; height follows the same ratio.
    Width(u32),
}

impl ResizeSpec {
    /// The ratio this spec represents for a source of the given width.
    pub fn ratio_for(self, src_width: u32) -> f64 {
        match self {
            ResizeSpec::Ratio(r) => r,
            ResizeSpec::Width(w) => w as f64 / src_width as f64,
        }
    }
}

/// Complete scaling plan computed from a source size and a ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Ratio the output was derived from
    pub ratio: f64,
    /// Final computed output dimensions, never zero on either axis
    pub out: Size,
}

impl ScalePlan {
    /// Number of bytes an RGBA8 destination buffer must hold.
    pub fn out_len(&self) -> usize {
        (self.out.w as usize) * (self.out.h as usize) * 4
    }

    /// True when the plan leaves the image at its original size.
    pub fn is_identity(&self) -> bool {
        self.input == self.out
    }
}

/// Plan a resize by uniform ratio.
///
/// # Errors
/// [`ScaleError::InvalidRatio`] for NaN, infinite, zero or negative ratios,
/// [`ScaleError::EmptyInput`] for a zero-sized source.
pub fn plan_ratio(input: Size, ratio: f64) -> Result<ScalePlan, ScaleError> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(ScaleError::InvalidRatio(ratio));
    }
    if input.w == 0 || input.h == 0 {
        return Err(ScaleError::EmptyInput);
    }
    Ok(ScalePlan {
        input,
        ratio,
        out: Size {
            w: scaled_side(input.w, ratio),
            h: scaled_side(input.h, ratio),
        },
    })
}

/// Plan a resize to a target width, preserving aspect ratio.
///
/// # Errors
/// [`ScaleError::InvalidWidth`] when `width` is zero, otherwise as [`plan_ratio`].
pub fn plan_width(input: Size, width: u32) -> Result<ScalePlan, ScaleError> {
    if width == 0 {
        return Err(ScaleError::InvalidWidth);
    }
    if input.w == 0 || input.h == 0 {
        return Err(ScaleError::EmptyInput);
    }
    plan_ratio(input, ResizeSpec::Width(width).ratio_for(input.w))
}

/// Plan a resize from either form of [`ResizeSpec`].
pub fn plan_spec(input: Size, spec: ResizeSpec) -> Result<ScalePlan, ScaleError> {
    match spec {
        ResizeSpec::Ratio(r) => plan_ratio(input, r),
        ResizeSpec::Width(w) => plan_width(input, w),
    }
}

// `as u32` saturates, so absurd ratios cannot wrap around.
fn scaled_side(side: u32, ratio: f64) -> u32 {
    ((side as f64 * ratio).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: Size = Size { w: 100, h: 50 };

    #[test]
    fn ratio_one_is_identity() {
        let plan = plan_ratio(SRC, 1.0).unwrap();
        assert_eq!(plan.out, SRC);
        assert!(plan.is_identity());
    }

    #[test]
    fn width_scales_height_by_same_ratio() {
        let plan = plan_width(SRC, 50).unwrap();
        assert_eq!(plan.out, Size { w: 50, h: 25 });
        assert_eq!(plan.ratio, 0.5);
    }

    #[test]
    fn width_lands_within_one_pixel_for_awkward_sizes() {
        let src = Size { w: 1013, h: 677 };
        for target in [1, 7, 64, 333, 500, 1012, 1013] {
            let plan = plan_width(src, target).unwrap();
            assert!((plan.out.w as i64 - target as i64).abs() <= 1, "target {target}");
            let expected_h = src.h as f64 * target as f64 / src.w as f64;
            assert!((plan.out.h as f64 - expected_h).abs() <= 1.0, "target {target}");
        }
    }

    #[test]
    fn tiny_ratio_clamps_to_one_pixel() {
        let plan = plan_ratio(SRC, 0.001).unwrap();
        assert_eq!(plan.out, Size { w: 1, h: 1 });

        let tall = Size { w: 4000, h: 3 };
        let plan = plan_width(tall, 8).unwrap();
        assert_eq!(plan.out, Size { w: 8, h: 1 });
    }

    #[test]
    fn rejects_degenerate_ratios() {
        for bad in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(plan_ratio(SRC, bad), Err(ScaleError::InvalidRatio(_))));
        }
        assert!(matches!(plan_width(SRC, 0), Err(ScaleError::InvalidWidth)));
        assert!(matches!(
            plan_ratio(Size { w: 0, h: 10 }, 0.5),
            Err(ScaleError::EmptyInput)
        ));
    }

    #[test]
    fn upscaling_is_not_bounded_here() {
        let plan = plan_spec(SRC, ResizeSpec::Ratio(2.0)).unwrap();
        assert_eq!(plan.out, Size { w: 200, h: 100 });
    }
}
