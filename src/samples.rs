//! Bundled sample pictures, addressed by their public path (`samples/x.jpg`).

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{info, warn};

use crate::error::{GuessError, GuessResult};
use crate::processing::decode_from;

const SAMPLE_PREFIX: &str = "samples/";
const SAMPLE_SUFFIX: &str = ".jpg";

/// Read-only access to the sample pictures under a content root.
#[derive(Debug, Clone)]
pub struct SampleLibrary {
    root: PathBuf,
}

impl SampleLibrary {
    /// `root` is the directory that contains `samples/`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Accepts only `samples/<name>.jpg` without any `..` component.
    pub fn validate(name: &str) -> GuessResult<()> {
        if !name.starts_with(SAMPLE_PREFIX) || !name.ends_with(SAMPLE_SUFFIX) || name.contains("..")
        {
            return Err(GuessError::invalid_spec("sample", "invalid sample"));
        }
        Ok(())
    }

    /// Validates, reads and decodes one sample.
    ///
    /// # Errors
    /// - [`GuessError::InvalidSpec`] for names outside the samples directory
    /// - [`GuessError::Io`] if the file cannot be read
    /// - [`GuessError::Decode`] if it is not an image
    pub async fn load(&self, name: &str) -> GuessResult<RgbaImage> {
        Self::validate(name)?;
        let path = self.root.join(name);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            warn!(sample = name, error = %e, "Unable to open sample");
            GuessError::io_at("open sample", path.display().to_string(), e)
        })?;
        info!(sample = name, bytes = bytes.len(), "Loaded sample");

        let origin = name.to_string();
        tokio::task::spawn_blocking(move || decode_from(&origin, &bytes)).await?
    }

    /// Public paths of every `*.jpg` in `samples/`, sorted. A missing
    /// directory is an empty gallery.
    pub async fn list(&self) -> GuessResult<Vec<String>> {
        let dir = self.root.join(SAMPLE_PREFIX);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GuessError::io_at("list samples", dir.display().to_string(), e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| GuessError::io_at("list samples", dir.display().to_string(), e))?
        {
            if !entry.file_type().await.is_ok_and(|t| t.is_file()) {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let name = format!("{SAMPLE_PREFIX}{file_name}");
            if Self::validate(&name).is_ok() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
