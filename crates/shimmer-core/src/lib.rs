//! Shimmer Core - build-time image placeholder generation.
//!
//! Shimmer scans a project tree for raster images and computes, for each, a
//! ThumbHash signature and a tiny PNG preview. The results are written to a
//! single `map.json` keyed by the image's path relative to the project root,
//! so a site can render a blurred preview before the real image loads.
//!
//! # Architecture
//!
//! ```text
//! root → discover → { read → fingerprint → decode → downsample → ThumbHash } → fold → map.json
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use shimmer_core::{Config, Shimmer};
//!
//! #[tokio::main]
//! async fn main() -> shimmer_core::Result<()> {
//!     let mut config = Config::load()?;
//!     config.site.root_dir = Some("./site".into());
//!     config.site.asset_dir = Some("assets".into());
//!     config.site.base_path = Some("/".into());
//!     config.site.cache_dir = Some("./site/.cache/shimmer".into());
//!
//!     let summary = Shimmer::new(config)?.run().await?;
//!     println!("{} placeholders", summary.table.len());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod types;

// Re-exports for convenient access
pub use config::{Config, SitePaths};
pub use error::{ConfigError, PipelineError, PipelineResult, Result, ShimmerError, StoreError};
pub use pipeline::{DiscoveredFile, Fingerprint, ImageProcessor, Placeholder, PlaceholderEncoder};
pub use store::{CacheStore, MAP_FILE_NAME};
pub use types::{ImageRecord, ImageTable, ProcessingStats};

use std::path::PathBuf;

use pipeline::{process_batch, FileDiscovery};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunSummary {
    /// The table that was persisted
    pub table: ImageTable,
    /// Counters for the run
    pub stats: ProcessingStats,
    /// Location of the written `map.json`
    pub map_path: PathBuf,
}

/// Shimmer pipeline - the main entry point.
///
/// Construction validates the whole configuration, so a `Shimmer` value
/// always has a complete site layout.
pub struct Shimmer {
    config: Config,
    site: SitePaths,
}

impl Shimmer {
    /// Validate `config` and resolve its site layout.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let site = config.site.resolve()?;
        tracing::debug!("Initializing Shimmer v{} for {:?}", VERSION, site.root_dir);
        Ok(Self { config, site })
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The validated site layout.
    pub fn site(&self) -> &SitePaths {
        &self.site
    }

    /// The cache store this pipeline writes to.
    pub fn store(&self) -> CacheStore {
        CacheStore::new(&self.site.cache_dir).with_pretty(self.config.output.pretty)
    }

    /// Find every candidate image under the project root.
    ///
    /// Fails on the first entry that cannot be read.
    pub fn discover(&self) -> PipelineResult<Vec<DiscoveredFile>> {
        FileDiscovery::new(&self.config.processing)
            .exclude(&self.site.cache_dir)
            .discover(&self.site.root_dir)
    }

    /// Rebuild the whole table and persist it.
    ///
    /// All-or-nothing: if any image fails, the error is returned and the
    /// previous `map.json` is left as it was. The cache directory is only
    /// cleared once every record has been computed.
    pub async fn run(&self) -> Result<RunSummary> {
        let files = self.discover()?;
        tracing::info!(
            "Found {} image(s) under {:?} ({} bytes)",
            files.len(),
            self.site.root_dir,
            FileDiscovery::total_size(&files)
        );

        let processor = ImageProcessor::new(&self.config, self.site.clone());
        let (table, stats) =
            process_batch(&processor, files, self.config.processing.parallel_workers).await?;

        let store = self.store();
        let map_path = tokio::task::spawn_blocking({
            let table = table.clone();
            move || -> Result<PathBuf> {
                store.reset()?;
                Ok(store.write(&table)?)
            }
        })
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))??;

        tracing::info!(
            "Wrote {} placeholder(s) to {:?} in {:?} ({:.1} img/sec)",
            stats.images,
            map_path,
            stats.elapsed,
            stats.images_per_second()
        );
        if stats.duplicate_keys > 0 {
            tracing::warn!(
                "{} record key(s) were produced by more than one file",
                stats.duplicate_keys
            );
        }

        Ok(RunSummary {
            table,
            stats,
            map_path,
        })
    }
}
