//! # Error Handling
//!
//! One error type for everything between the request boundary and the three
//! core components (codec, store, inference). Every failure travels back up
//! the call chain as a value; the HTTP layer decides the status code from
//! [`GuessError::is_client_error`] and [`HasSeverity::severity`].
//!
//! ## Taxonomy
//!
//! | Variant | Raised by | Surfaced as |
//! |---------|-----------|-------------|
//! | `Decode` | codec, uploads and samples | client error |
//! | `NotFound` | session store | client error |
//! | `InvalidSpec` | parameter parsing, sample names, size checks | client error |
//! | `Inference` | inference client, after the last attempt | server error |
//! | `Io` | sample loading | server error |
//! | `Encode` | codec | fatal: invariant violation |
//! | `Resize` | resize pipeline | server error |
//! | `Config` | startup configuration | startup failure |
//! | `Internal` | worker-pool plumbing | server error |
//!
//! Only the inference client retries; every other error is reported once.
//!
//! ## Usage
//!
//! ```rust
//! use pixel_guess::error::{ErrorSeverity, GuessError, HasSeverity};
//!
//! let error = GuessError::invalid_spec("ratio", "ratio must be between 0.0 and 1.0");
//! assert_eq!(error.category(), "invalid_spec");
//! assert!(error.is_client_error());
//! assert_eq!(error.severity(), ErrorSeverity::Warning);
//! ```

use std::{error::Error as StdError, fmt};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// The caller sent something we cannot work with
    Warning,
    /// Something on our side (or upstream) failed; the process carries on
    Error,
    /// An internal invariant was violated
    Fatal,
}

/// Base error type for the guessing service
#[derive(Debug)]
pub enum GuessError {
    /// Uploaded or bundled bytes are not a recognised, complete image
    Decode {
        origin: String,
        source: image::ImageError,
    },
    /// Encoding an image we produced ourselves failed
    Encode {
        width: u32,
        height: u32,
        source: image::ImageError,
    },
    /// No live entry for this image ID (evicted, or never existed)
    NotFound { image_id: String },
    /// Resize parameters or sample names missing or out of range
    InvalidSpec { field: String, reason: String },
    /// The model endpoint failed on every attempt
    Inference {
        attempts: u32,
        last_error: anyhow::Error,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
    },
    /// The scaler refused its input
    Resize { source: guess_scale::ScaleError },
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
    },
    /// Plumbing failures (e.g. a blocking worker panicked)
    Internal { operation: String, reason: String },
}

impl GuessError {
    /// Create a decode error for bytes that came from `origin`
    pub fn decode(origin: impl Into<String>, source: image::ImageError) -> Self {
        Self::Decode {
            origin: origin.into(),
            source,
        }
    }

    /// Create an encode error
    pub fn encode(width: u32, height: u32, source: image::ImageError) -> Self {
        Self::Encode {
            width,
            height,
            source,
        }
    }

    /// Create a not-found error
    pub fn not_found(image_id: impl Into<String>) -> Self {
        Self::NotFound {
            image_id: image_id.into(),
        }
    }

    /// Create an invalid-spec error
    pub fn invalid_spec(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an inference error carrying the last attempt's failure
    pub fn inference(attempts: u32, last_error: anyhow::Error) -> Self {
        Self::Inference {
            attempts,
            last_error,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
        }
    }

    /// Create an I/O error tied to a path
    pub fn io_at(
        operation: impl Into<String>,
        path: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: Some(path.into()),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Internal {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
            Self::NotFound { .. } => "not_found",
            Self::InvalidSpec { .. } => "invalid_spec",
            Self::Inference { .. } => "inference",
            Self::Io { .. } => "io",
            Self::Resize { .. } => "resize",
            Self::Config { .. } => "config",
            Self::Internal { .. } => "internal",
        }
    }

    /// Whether the caller is at fault (maps to a 4xx response)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::NotFound { .. } | Self::InvalidSpec { .. }
        )
    }
}

impl fmt::Display for GuessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuessError::Decode { origin, source } => {
                write!(f, "Unable to decode image from {}: {}", origin, source)
            }
            GuessError::Encode {
                width,
                height,
                source,
            } => {
                write!(
                    f,
                    "Failed to encode {}x{} image as JPEG: {}",
                    width, height, source
                )
            }
            GuessError::NotFound { image_id } => write!(f, "no such image: {}", image_id),
            GuessError::InvalidSpec { reason, .. } => write!(f, "{}", reason),
            GuessError::Inference {
                attempts,
                last_error,
            } => {
                write!(
                    f,
                    "Model call failed after {} attempts: {}",
                    attempts, last_error
                )
            }
            GuessError::Io {
                operation,
                path,
                source,
            } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "I/O error during {} on '{}': {}",
                        operation, path, source
                    )
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
            GuessError::Resize { source } => write!(f, "Resize failed: {}", source),
            GuessError::Config {
                field,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            GuessError::Internal { operation, reason } => {
                write!(f, "Internal error during {}: {}", operation, reason)
            }
        }
    }
}

impl StdError for GuessError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Decode { source, .. } => Some(source),
            Self::Encode { source, .. } => Some(source),
            Self::Inference { last_error, .. } => Some(&**last_error),
            Self::Io { source, .. } => Some(source),
            Self::Resize { source } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type GuessResult<T> = Result<T, GuessError>;

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for GuessError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            // We only ever encode images we decoded and resized ourselves.
            Self::Encode { .. } => ErrorSeverity::Fatal,
            e if e.is_client_error() => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

impl From<guess_scale::ScaleError> for GuessError {
    fn from(error: guess_scale::ScaleError) -> Self {
        Self::Resize { source: error }
    }
}

impl From<tokio::task::JoinError> for GuessError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::internal("blocking image task", error.to_string())
    }
}
