//! Command handlers for the `shimmer` binary.

pub mod build;
pub mod config;
pub mod show;

use anyhow::Context;
use shimmer_core::Config;
use std::path::{Path, PathBuf};

/// Load the config from `path`, or from the default location when `None`.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            let path = expand_path(path);
            Config::load_from(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Ok(Config::load()?),
    }
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}
