//! File discovery for finding images in a project tree.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::ProcessingConfig;
use crate::error::{PipelineError, PipelineResult};

/// Discovers image files in directories.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    extensions: Vec<String>,
    ignore_dirs: Vec<String>,
    excluded: Vec<PathBuf>,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            extensions: config
                .supported_formats
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            ignore_dirs: config.ignore_dirs.clone(),
            excluded: Vec::new(),
        }
    }

    /// Skip everything under `path` (used for the cache directory).
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    /// Recursively find all supported image files under `root`.
    ///
    /// Directories are never returned. Results are sorted by path. An entry
    /// that cannot be read (permissions, symlink loop, failed stat) fails the
    /// whole discovery, so a run never writes a table with images missing.
    pub fn discover(&self, root: &Path) -> PipelineResult<Vec<DiscoveredFile>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry));

        for entry in walker {
            let entry = entry.map_err(|e| walk_error(root, e))?;
            if !entry.file_type().is_file() || !self.is_supported(entry.path()) {
                continue;
            }
            let meta = entry.metadata().map_err(|e| walk_error(root, e))?;
            files.push(DiscoveredFile {
                path: entry.into_path(),
                size: meta.len(),
            });
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.extensions.iter().any(|fmt| *fmt == ext_lower)
            })
            .unwrap_or(false)
    }

    /// Directories that are never descended into.
    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        if self.excluded.iter().any(|ex| entry.path() == ex) {
            return true;
        }
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| self.ignore_dirs.iter().any(|ignored| ignored == name))
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

fn walk_error(root: &Path, err: walkdir::Error) -> PipelineError {
    let path = err.path().unwrap_or(root).to_path_buf();
    tracing::error!("Discovery failed at {:?}: {err}", path);
    PipelineError::Read {
        path,
        source: err.into(),
    }
}
