//! Sub-configuration structs and their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raster extensions the pipeline scans for.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Site layout supplied by the host build tool.
///
/// Every field is optional in the file so a config can be completed by CLI
/// flags; [`SiteConfig::resolve`](super::SiteConfig::resolve) enforces that
/// all of them are present before a run starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Project root scanned for images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,

    /// Directory built assets are emitted to, relative to the site root (e.g. "assets")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_dir: Option<String>,

    /// Public URL prefix the site is served under (e.g. "/docs/")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Directory that receives map.json
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// Validated site layout with every value present and paths absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root_dir: PathBuf,
    pub asset_dir: String,
    pub base_path: String,
    pub cache_dir: PathBuf,
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum number of images processed concurrently
    pub parallel_workers: usize,

    /// Extensions picked up by discovery (case-insensitive)
    pub supported_formats: Vec<String>,

    /// Directory names never descended into during discovery
    pub ignore_dirs: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            supported_formats: SUPPORTED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            ignore_dirs: vec!["node_modules".to_string(), ".git".to_string()],
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 20000,
            decode_timeout_ms: 10000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print map.json
    pub pretty: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
