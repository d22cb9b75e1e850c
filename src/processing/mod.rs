//! # Processing Module
//!
//! Pixel work that happens inside a request: turning uploaded bytes into an
//! image, shrinking it, and turning the result back into JPEG bytes.
//!
//! Everything here is synchronous and CPU-bound; the service runs it on the
//! blocking thread pool.

pub mod codec;
pub mod resize;

pub use codec::{decode, decode_from, encode_jpeg};
pub use resize::{resize, resize_by_ratio, resize_by_width};
