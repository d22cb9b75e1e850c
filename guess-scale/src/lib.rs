// SPDX-License-Identifier: MIT
//! # guess-scale: Deterministic Downscaling for Progressive Guessing
//!
//! This crate computes and executes the "make it smaller" step of the guessing
//! game: a source raster is shrunk by a uniform ratio, or to a target pixel
//! width, and the result is handed to a vision model to see how small a
//! picture can get before it stops being recognisable.
//!
//! ## Key Components
//!
//! - [`plan`]: Turning a [`plan::ResizeSpec`] into concrete output dimensions
//! - [`cpu`]: Nearest-neighbour scaling of RGBA8 buffers via `fast_image_resize`
//!
//! ## Guarantees
//!
//! - Both axes are scaled by the *same* ratio, so aspect ratio is preserved
//!   within rounding.
//! - Output dimensions are never zero: every axis is clamped to at least 1px.
//! - Resampling is nearest-neighbour, so the same input always yields the
//!   same pixels.
//! - The pipeline never enforces an upper bound on the ratio; "downscale
//!   only" is the caller's contract.
//!
//! ## Usage Example
//!
//! ```rust
//! use guess_scale::{cpu::scale_rgba_cpu, plan::{plan_width, Size}};
//!
//! let input = Size { w: 100, h: 50 };
//! let plan = plan_width(input, 50).unwrap();
//! assert_eq!((plan.out.w, plan.out.h), (50, 25));
//!
//! let src = vec![255u8; 100 * 50 * 4];
//! let mut dst = vec![0u8; plan.out_len()];
//! let mut resizer = fast_image_resize::Resizer::new();
//! scale_rgba_cpu(&mut resizer, &src, input, &plan, &mut dst).unwrap();
//! ```

pub mod cpu;
pub mod plan;

pub use cpu::{scale_rgba_cpu, ScaleError};
pub use plan::{plan_ratio, plan_spec, plan_width, ResizeSpec, ScalePlan, Size};
