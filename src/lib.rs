//! # Pixel Guess
//!
//! A small photo service: upload a picture, fetch progressively smaller
//! versions of it, and ask a vision model what each version looks like.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `processing`: decoding uploads, shrinking images, encoding JPEG
//! - `core`: the bounded session store for uploaded images
//! - `inference`: the model backend trait, the retrying client and the
//!   Vertex AI backend
//! - `samples`: access to the bundled sample pictures
//! - `service`: request-level orchestration of all of the above
//! - `server`: axum routes and HTTP error mapping
//! - `config`: runtime configuration and validation
//!
//! Pure size planning and the nearest-neighbour scaler live in the
//! `guess-scale` workspace crate.
//!
//! ## Example
//!
//! ```rust
//! use pixel_guess::processing::resize_by_width;
//! use image::RgbaImage;
//!
//! let small = resize_by_width(&RgbaImage::new(100, 50), 50).unwrap();
//! assert_eq!(small.dimensions(), (50, 25));
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod inference;
pub mod processing;
pub mod samples;
pub mod server;
pub mod service;

/// Re-export error types for convenience
pub use crate::error::{ErrorSeverity, GuessError, GuessResult, HasSeverity};

pub use crate::config::ServerConfig;
pub use crate::core::{ImageId, SessionImageStore};
pub use crate::inference::{CaptionAnswer, CaptionBackend, InferenceClient, RetryPolicy};
pub use crate::service::{GuessService, ImageSource, ResizeRequest, Uploaded};

/// Re-export the resize descriptor shared with `guess-scale`
pub use guess_scale::ResizeSpec;
