//! # Inference Module
//!
//! Asking an external vision model what a picture shows.
//!
//! ## Architecture
//!
//! 1. **CaptionBackend Trait**: one call to one model endpoint, no retries
//! 2. **InferenceClient**: wraps any backend with the fixed retry policy
//! 3. **VertexBackend**: the production backend, Gemini on Vertex AI over REST
//! 4. **TokenSource**: bearer tokens for the backend, fetched per call
//!
//! Backends are shared as `Arc<dyn CaptionBackend>`, so tests swap in fakes
//! without touching the service or the HTTP layer.

pub mod auth;
pub mod client;
pub mod vertex;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

pub use auth::{GoogleCredentials, StaticToken, TokenSource};
pub use client::{InferenceClient, RetryPolicy};
pub use vertex::{VertexBackend, VertexSettings};

/// Everything one model call needs.
#[derive(Debug, Clone, Copy)]
pub struct CaptionRequest<'a> {
    /// Encoded image bytes.
    pub image: &'a [u8],
    /// Encoding of `image`, e.g. `"jpeg"`.
    pub format: &'a str,
    /// Instruction sent alongside the image.
    pub prompt: &'a str,
    pub temperature: f32,
}

impl CaptionRequest<'_> {
    /// MIME type matching `format`.
    pub fn mime_type(&self) -> String {
        format!("image/{}", self.format)
    }
}

/// First answer fragment returned by the model.
///
/// Serializes untagged: a text answer is a plain JSON string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CaptionAnswer {
    Text(String),
    Structured(serde_json::Value),
}

impl CaptionAnswer {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CaptionAnswer::Text(text) => Some(text),
            CaptionAnswer::Structured(_) => None,
        }
    }
}

/// Abstract model endpoint.
/// Implement this trait to plug in another captioning service.
#[async_trait]
pub trait CaptionBackend: Send + Sync {
    /// Perform exactly one call.
    ///
    /// # Returns
    /// Candidate answers in the order the model ranked them. An empty list
    /// is allowed; the client treats it as a failed attempt.
    async fn generate(&self, request: &CaptionRequest<'_>) -> Result<Vec<CaptionAnswer>>;

    /// Short label for logs.
    fn name(&self) -> &str;
}
