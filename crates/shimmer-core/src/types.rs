//! Core data types for the Shimmer pipeline.
//!
//! [`ImageRecord`] and [`ImageTable`] are the persisted contract read by the
//! runtime preview component, so their JSON field names must stay stable.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::time::Duration;

/// Everything known about one source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    // === Placeholder ===
    /// Standard base64 of the binary ThumbHash
    pub signature_base64: String,

    /// `data:image/png;base64,...` preview decoded from the signature
    pub preview_data_url: String,

    /// Width of the downsampled image the signature was computed from
    pub width: u32,

    /// Height of the downsampled image the signature was computed from
    pub height: u32,

    /// Width of the source image
    pub original_width: u32,

    /// Height of the source image
    pub original_height: u32,

    // === Identity ===
    /// Path relative to the project root, forward slashes
    pub asset_file_name: String,

    /// Absolute path, forward slashes
    pub asset_full_file_name: String,

    /// BLAKE3 fingerprint of the file bytes (base64)
    pub asset_full_hash: String,

    /// URL-safe cache-busting token derived from `asset_full_hash`
    pub asset_file_hash: String,

    // === Public URLs ===
    /// Asset URL without the site base path
    pub asset_url: String,

    /// Asset URL including the site base path; always starts with `/`
    pub asset_url_with_base: String,
}

/// Lookup table from `asset_file_name` to its record.
///
/// Backed by a `BTreeMap` so serialization order is stable and two runs over
/// the same tree write byte-identical JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageTable {
    entries: BTreeMap<String, ImageRecord>,
}

impl ImageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its `asset_file_name`.
    ///
    /// Returns the record previously stored under the same key, if any.
    pub fn insert(&mut self, record: ImageRecord) -> Option<ImageRecord> {
        self.entries.insert(record.asset_file_name.clone(), record)
    }

    pub fn get(&self, key: &str) -> Option<&ImageRecord> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ImageRecord> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ImageTable {
    type Item = (&'a String, &'a ImageRecord);
    type IntoIter = btree_map::Iter<'a, String, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Counters collected over one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    /// Records in the written table
    pub images: usize,

    /// Bytes of source image data read
    pub total_bytes: u64,

    /// Keys produced by more than one file (last write won)
    pub duplicate_keys: usize,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl ProcessingStats {
    /// Throughput in images per second.
    pub fn images_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.images as f64 / secs
        } else {
            0.0
        }
    }
}
