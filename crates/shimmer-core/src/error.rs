//! Error types for the Shimmer placeholder pipeline.
//!
//! Errors are organized by stage so a failed build names the file and the
//! step that broke (decode, read, store) instead of a bare I/O message.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Shimmer operations.
#[derive(Error, Debug)]
pub enum ShimmerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-file pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Cache store errors (reset, write, read of map.json)
    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors. Raised before any file is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A required value was not supplied
    #[error("Missing required configuration value: {0}")]
    Missing(&'static str),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Per-file pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image decoding failed (corrupt or truncated data)
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Bytes are not a recognized raster format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Preview bitmap could not be produced from a signature
    #[error("Preview encoding failed for {path}: {message}")]
    Preview { path: PathBuf, message: String },

    /// A worker task died before returning a record
    #[error("Worker task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// True for errors caused by the image content itself rather than I/O.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::UnsupportedFormat { .. }
                | Self::ImageTooLarge { .. }
                | Self::Timeout { .. }
        )
    }
}

/// Errors from the on-disk cache store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Clearing the output directory failed
    #[error("Failed to reset {path}: {source}")]
    Reset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or renaming map.json failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading map.json failed
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// map.json is not a valid table
    #[error("Malformed table at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Shimmer results.
pub type Result<T> = std::result::Result<T, ShimmerError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_classification() {
        let err = PipelineError::Decode {
            path: PathBuf::from("a.png"),
            message: "truncated".into(),
        };
        assert!(err.is_decode_error());

        let err = PipelineError::Read {
            path: PathBuf::from("a.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(!err.is_decode_error());
    }

    #[test]
    fn test_missing_config_message_names_field() {
        let err = ShimmerError::from(ConfigError::Missing("site.cache_dir"));
        assert!(err.to_string().contains("site.cache_dir"));
    }
}
