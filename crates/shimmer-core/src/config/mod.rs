//! Configuration management for Shimmer.
//!
//! Configuration is loaded from `config.toml` in the platform config
//! directory, with sensible defaults. The `[site]` section is usually filled
//! in by the host build tool (or CLI flags) rather than the file itself.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Root configuration structure for Shimmer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site layout (root, asset dir, base path, cache dir)
    pub site: SiteConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/rs.shimmer.shimmer/config.toml
    /// - Linux: ~/.config/shimmer/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\shimmer\config\config.toml
    ///
    /// Falls back to ~/.shimmer/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("rs", "shimmer", "shimmer")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".shimmer").join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

impl SiteConfig {
    /// Turn the optional site values into a complete [`SitePaths`].
    ///
    /// Paths get `~` expansion and are made absolute against the current
    /// directory. The root must be an existing directory.
    pub fn resolve(&self) -> Result<SitePaths, ConfigError> {
        let root_dir = self
            .root_dir
            .as_deref()
            .ok_or(ConfigError::Missing("site.root_dir"))?;
        let asset_dir = self
            .asset_dir
            .clone()
            .ok_or(ConfigError::Missing("site.asset_dir"))?;
        let base_path = self
            .base_path
            .clone()
            .ok_or(ConfigError::Missing("site.base_path"))?;
        let cache_dir = self
            .cache_dir
            .as_deref()
            .ok_or(ConfigError::Missing("site.cache_dir"))?;

        let root_dir = absolutize(root_dir)?;
        if !root_dir.is_dir() {
            return Err(ConfigError::ValidationError(format!(
                "site.root_dir is not a directory: {}",
                root_dir.display()
            )));
        }

        if asset_dir.starts_with('/') || asset_dir.starts_with('\\') {
            return Err(ConfigError::ValidationError(format!(
                "site.asset_dir must be relative, got {asset_dir:?}"
            )));
        }
        if base_path.contains("://") {
            return Err(ConfigError::ValidationError(format!(
                "site.base_path must be a URL path, not an absolute URL: {base_path:?}"
            )));
        }

        let cache_dir = absolutize(cache_dir)?;
        // The cache dir is removed on every run, so it must not hold the sources
        if root_dir.starts_with(&cache_dir) {
            return Err(ConfigError::ValidationError(format!(
                "site.cache_dir {} must not be the project root or one of its parents \
                 (it is cleared on every run)",
                cache_dir.display()
            )));
        }

        Ok(SitePaths {
            root_dir,
            asset_dir,
            base_path,
            cache_dir,
        })
    }
}

/// Expand `~`, make a path absolute against the current directory, and
/// resolve `.` and `..` lexically.
fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    let raw = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(&raw).into_owned());
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()?.join(expanded)
    };
    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
