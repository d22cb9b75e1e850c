//! # Core Infrastructure Module
//!
//! Shared state that outlives a single request: the bounded session store
//! for uploaded images and the identifiers handed out for its entries.

pub mod image_id;
pub mod store;

pub use image_id::ImageId;
pub use store::{SessionImageStore, StoreStats};
