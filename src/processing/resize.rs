//! Resize Pipeline wrapper: owned `RgbaImage` in, new owned `RgbaImage` out.
//!
//! Planning and pixel work live in the `guess-scale` crate; this module only
//! adapts between its raw buffers and the `image` crate's types.

use fast_image_resize::Resizer;
use guess_scale::{ResizeSpec, ScalePlan, Size, plan_ratio, plan_spec, plan_width, scale_rgba_cpu};
use image::RgbaImage;
use tracing::debug;

use crate::error::{GuessError, GuessResult};

/// Scale both axes by `ratio`. Requires `ratio > 0`; values above 1.0 upscale.
pub fn resize_by_ratio(src: &RgbaImage, ratio: f64) -> GuessResult<RgbaImage> {
    let plan = plan_ratio(size_of(src), ratio)?;
    execute(src, &plan)
}

/// Scale to `width` pixels wide, height following the same ratio.
pub fn resize_by_width(src: &RgbaImage, width: u32) -> GuessResult<RgbaImage> {
    let plan = plan_width(size_of(src), width)?;
    execute(src, &plan)
}

pub fn resize(src: &RgbaImage, spec: ResizeSpec) -> GuessResult<RgbaImage> {
    let plan = plan_spec(size_of(src), spec)?;
    execute(src, &plan)
}

fn size_of(img: &RgbaImage) -> Size {
    Size {
        w: img.width(),
        h: img.height(),
    }
}

fn execute(src: &RgbaImage, plan: &ScalePlan) -> GuessResult<RgbaImage> {
    let mut dst = vec![0u8; plan.out_len()];
    scale_rgba_cpu(&mut Resizer::new(), src.as_raw(), plan.input, plan, &mut dst)?;
    debug!(
        from_w = plan.input.w,
        from_h = plan.input.h,
        to_w = plan.out.w,
        to_h = plan.out.h,
        ratio = plan.ratio,
        "Resized image"
    );
    RgbaImage::from_raw(plan.out.w, plan.out.h, dst)
        .ok_or_else(|| GuessError::internal("resize", "output buffer does not match planned size"))
}
