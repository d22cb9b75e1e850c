//! # Configuration Module
//!
//! Runtime configuration for the guessing server. The binary fills a
//! [`ServerConfig`] from command-line flags and environment variables; the
//! library only ever sees the validated struct.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `addr` | `String` | `""` (all interfaces) | Listen host |
//! | `port` | `u16` | `8080` | Listen port |
//! | `max_images` | `usize` | `20` | Session store capacity |
//! | `jpeg_quality` | `u8` | `75` | Quality of every JPEG we produce (1-100) |
//! | `max_upload_bytes` | `usize` | 32 MiB | Largest accepted upload body |
//! | `content_root` | `PathBuf` | `.` | Holds `index.html`, `static/` and `samples/` |
//! | `project_id` | `String` | `""` | Cloud project hosting the model |
//! | `location` | `String` | `us-central1` | Model region |
//! | `model` | `String` | `gemini-1.5-flash` | Model name |
//! | `endpoint` | `Option<String>` | derived | Full `generateContent` URL override |
//! | `access_token` | `Option<String>` | none | Fixed bearer token; otherwise Application Default Credentials are used |
//! | `temperature` | `f32` | `0.4` | Sampling temperature (0.0-2.0) |
//! | `prompt` | `String` | see [`DEFAULT_PROMPT`] | Instruction sent with every image |
//! | `request_timeout_secs` | `u64` | `30` | Per-attempt timeout for the model call |
//!
//! ## Examples
//!
//! ```rust
//! use pixel_guess::config::ServerConfig;
//!
//! let mut config = ServerConfig::default();
//! config.project_id = "my-project".to_string();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.listen_addr(), "0.0.0.0:8080");
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{GuessError, GuessResult};
use crate::inference::{RetryPolicy, VertexSettings};

/// Instruction sent alongside every image.
pub const DEFAULT_PROMPT: &str =
    "What does this picture look like? Provide a short answer in less than 8 words.";

/// Configuration structure for the guessing server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen host. Empty means all interfaces.
    pub addr: String,

    /// Listen port.
    pub port: u16,

    /// How many uploaded images stay in memory before the oldest is evicted.
    ///
    /// Must be at least 1.
    pub max_images: usize,

    /// JPEG quality for resized images, both returned and sent to the model.
    pub jpeg_quality: u8,

    /// Upper bound on the upload request body, in bytes.
    pub max_upload_bytes: usize,

    /// Directory holding `index.html`, `static/` and `samples/`.
    pub content_root: PathBuf,

    /// Cloud project that hosts the model.
    pub project_id: String,

    /// Region of the model endpoint.
    pub location: String,

    /// Model name, e.g. `gemini-1.5-flash`.
    pub model: String,

    /// Full `generateContent` URL. When unset it is derived from
    /// `project_id`, `location` and `model`.
    pub endpoint: Option<String>,

    /// Fixed bearer token for the model endpoint. When unset, credentials
    /// are discovered from the environment.
    pub access_token: Option<String>,

    /// Sampling temperature for the model.
    pub temperature: f32,

    /// Instruction sent with every image.
    pub prompt: String,

    /// Timeout for a single model call attempt.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    /// Port 8080, 20 images, Gemini in `us-central1` at temperature 0.4.
    fn default() -> Self {
        Self {
            addr: String::new(),
            port: 8080,
            max_images: 20,
            jpeg_quality: 75,
            max_upload_bytes: 32 * 1024 * 1024,
            content_root: PathBuf::from("."),
            project_id: String::new(),
            location: "us-central1".to_string(),
            model: "gemini-1.5-flash".to_string(),
            endpoint: None,
            access_token: None,
            temperature: 0.4,
            prompt: DEFAULT_PROMPT.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Validates the configuration parameters.
    ///
    /// Time complexity: O(1) - range checks on numeric fields plus one
    /// emptiness check.
    pub fn validate(&self) -> GuessResult<()> {
        if self.max_images == 0 {
            return Err(GuessError::config(
                "max_images",
                "0",
                "the store must hold at least one image",
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(GuessError::config(
                "jpeg_quality",
                self.jpeg_quality.to_string(),
                "must be between 1 and 100",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GuessError::config(
                "temperature",
                self.temperature.to_string(),
                "must be between 0.0 and 2.0",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(GuessError::config(
                "request_timeout_secs",
                "0",
                "must be greater than 0",
            ));
        }
        if self.endpoint.is_none() && self.project_id.trim().is_empty() {
            return Err(GuessError::config(
                "project_id",
                "",
                "set GOOGLE_CLOUD_PROJECT or provide an explicit model endpoint",
            ));
        }
        Ok(())
    }

    /// `host:port` string suitable for binding. An empty host binds every
    /// IPv4 interface.
    pub fn listen_addr(&self) -> String {
        let host = match self.addr.trim() {
            "" => "0.0.0.0",
            host => host,
        };
        format!("{}:{}", host, self.port)
    }

    /// Connection settings for the Vertex AI backend.
    pub fn vertex_settings(&self) -> VertexSettings {
        VertexSettings {
            project_id: self.project_id.clone(),
            location: self.location.clone(),
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            access_token: self.access_token.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Retry behaviour of the inference client. Not configurable: three
    /// attempts, 500ms apart.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }

    pub fn index_file(&self) -> PathBuf {
        self.content_root.join("index.html")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.content_root.join("static")
    }

    pub fn samples_dir(&self) -> PathBuf {
        self.content_root.join("samples")
    }
}
