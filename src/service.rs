//! # Guess Service
//!
//! Ties the codec, the resize pipeline, the session store, the samples and
//! the inference client together. The HTTP layer holds one
//! `Arc<GuessService>` and calls exactly one method per request.
//!
//! Request flow for `/resized` and `/guess`:
//!
//! 1. Resolve the source: a stored upload (`imgid`) wins over a sample.
//! 2. Resize on the blocking pool.
//! 3. Encode as JPEG on the blocking pool.
//! 4. For guesses, hand the JPEG to the inference client.

use std::sync::Arc;

use guess_scale::ResizeSpec;
use image::RgbaImage;
use serde::Serialize;
use tokio::task::spawn_blocking;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::{ImageId, SessionImageStore};
use crate::error::{GuessError, GuessResult};
use crate::inference::{CaptionAnswer, CaptionBackend, InferenceClient};
use crate::processing::{decode, encode_jpeg, resize};
use crate::samples::SampleLibrary;

/// Where the picture to resize comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An earlier upload, by image ID.
    Stored(String),
    /// A bundled sample, by public path (`samples/x.jpg`).
    Sample(String),
}

/// A validated resize request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeRequest {
    pub source: ImageSource,
    pub spec: ResizeSpec,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Uploaded {
    #[serde(rename = "imageID")]
    pub image_id: ImageId,
    pub width: u32,
    pub height: u32,
}

pub struct GuessService {
    store: SessionImageStore,
    samples: SampleLibrary,
    inference: InferenceClient,
    prompt: String,
    jpeg_quality: u8,
}

impl GuessService {
    pub fn new(
        store: SessionImageStore,
        samples: SampleLibrary,
        inference: InferenceClient,
        prompt: impl Into<String>,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            store,
            samples,
            inference,
            prompt: prompt.into(),
            jpeg_quality,
        }
    }

    /// Wires a service from validated configuration and a model backend.
    pub fn from_config(config: &ServerConfig, backend: Arc<dyn CaptionBackend>) -> Self {
        let inference =
            InferenceClient::new(backend, config.temperature).with_policy(config.retry_policy());
        Self::new(
            SessionImageStore::new(config.max_images),
            SampleLibrary::new(&config.content_root),
            inference,
            config.prompt.clone(),
            config.jpeg_quality,
        )
    }

    pub fn store(&self) -> &SessionImageStore {
        &self.store
    }

    /// Sample paths offered by the gallery.
    pub async fn samples(&self) -> GuessResult<Vec<String>> {
        self.samples.list().await
    }

    /// Decodes an uploaded picture and keeps it for later resize requests.
    ///
    /// # Errors
    /// [`GuessError::Decode`] if the bytes are not an image. The store is
    /// left untouched in that case.
    pub async fn upload(&self, bytes: impl AsRef<[u8]> + Send + 'static) -> GuessResult<Uploaded> {
        info!(bytes = bytes.as_ref().len(), "Receiving user picture");
        let img = spawn_blocking(move || decode(bytes.as_ref())).await??;
        let (width, height) = img.dimensions();
        let image_id = self.store.put(img);
        Ok(Uploaded {
            image_id,
            width,
            height,
        })
    }

    /// Resized picture as JPEG bytes.
    pub async fn resized(&self, request: &ResizeRequest) -> GuessResult<Vec<u8>> {
        let source = self.resolve(&request.source).await?;
        let spec = checked_spec(&source, request.spec)?;
        let quality = self.jpeg_quality;
        spawn_blocking(move || {
            let small = resize(&source, spec)?;
            encode_jpeg(&small, quality)
        })
        .await?
    }

    /// What the model thinks the resized picture shows.
    pub async fn guess(&self, request: &ResizeRequest) -> GuessResult<CaptionAnswer> {
        let jpeg = self.resized(request).await?;
        self.inference.caption(&jpeg, &self.prompt).await
    }

    async fn resolve(&self, source: &ImageSource) -> GuessResult<Arc<RgbaImage>> {
        match source {
            ImageSource::Stored(id) => {
                info!(image_id = %id, "Resizing stored picture");
                self.store.get(id)
            }
            ImageSource::Sample(name) => {
                info!(sample = %name, "Resizing sample picture");
                self.samples.load(name).await.map(Arc::new)
            }
        }
    }
}

/// Resizing only ever shrinks: ratios must lie in `(0, 1]` and widths in
/// `1..=source width`.
fn checked_spec(source: &RgbaImage, spec: ResizeSpec) -> GuessResult<ResizeSpec> {
    match spec {
        ResizeSpec::Ratio(ratio) => {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(GuessError::invalid_spec(
                    "ratio",
                    "ratio must be between 0.0 and 1.0",
                ));
            }
            info!(ratio, "Resizing with ratio");
        }
        ResizeSpec::Width(width) => {
            if width == 0 || width > source.width() {
                return Err(GuessError::invalid_spec(
                    "pixelwidth",
                    format!("pixelwidth must be between 1 and {}", source.width()),
                ));
            }
            info!(
                width,
                ratio = spec.ratio_for(source.width()),
                "Resizing with width"
            );
        }
    }
    Ok(spec)
}
