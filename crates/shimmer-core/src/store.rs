//! On-disk cache store holding the persisted `map.json` table.
//!
//! The store owns its directory exclusively: [`CacheStore::reset`] removes
//! it wholesale, and [`CacheStore::write`] stages the table in a temporary
//! file next to `map.json` before renaming it into place, so readers never
//! see a half-written document.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::types::ImageTable;

/// File name of the persisted table inside the cache directory.
pub const MAP_FILE_NAME: &str = "map.json";

/// Reads and writes the lookup table in a cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    pretty: bool,
}

impl CacheStore {
    /// Create a store rooted at `dir`. Nothing is touched on disk yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pretty: false,
        }
    }

    /// Pretty-print the JSON document.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of `map.json`.
    pub fn map_path(&self) -> PathBuf {
        self.dir.join(MAP_FILE_NAME)
    }

    /// Remove the cache directory and everything in it.
    ///
    /// Succeeds when the directory does not exist.
    pub fn reset(&self) -> Result<(), StoreError> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                tracing::debug!("Cleared cache directory {:?}", self.dir);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Reset {
                path: self.dir.clone(),
                source,
            }),
        }
    }

    /// Serialize `table` to `map.json`, creating the directory as needed.
    ///
    /// Returns the path written.
    pub fn write(&self, table: &ImageTable) -> Result<PathBuf, StoreError> {
        let target = self.map_path();
        let write_err = |source| StoreError::Write {
            path: target.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_err)?;

        let staged = tempfile::Builder::new()
            .prefix(".map-")
            .suffix(".json.tmp")
            .tempfile_in(&self.dir)
            .map_err(write_err)?;
        {
            let mut writer = BufWriter::new(staged.as_file());
            write_json(&mut writer, table, self.pretty).map_err(write_err)?;
            writer.flush().map_err(write_err)?;
        }
        staged.as_file().sync_all().map_err(write_err)?;
        staged.persist(&target).map_err(|e| write_err(e.error))?;

        tracing::debug!("Wrote {} record(s) to {:?}", table.len(), target);
        Ok(target)
    }

    /// Load `map.json` back into a table.
    pub fn read(&self) -> Result<ImageTable, StoreError> {
        let path = self.map_path();
        let file = File::open(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| StoreError::Malformed { path, source })
    }

    /// Whether a table has been written.
    pub fn exists(&self) -> bool {
        self.map_path().is_file()
    }
}

/// Write one JSON document followed by a newline.
fn write_json<W: Write, T: Serialize>(writer: &mut W, item: &T, pretty: bool) -> io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, item).map_err(io::Error::other)?;
    } else {
        serde_json::to_writer(&mut *writer, item).map_err(io::Error::other)?;
    }
    writeln!(writer)
}
