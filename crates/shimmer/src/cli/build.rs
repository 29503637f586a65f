//! The `shimmer build` command: regenerate map.json for a site.

use clap::Args;
use shimmer_core::{Config, ConfigError, Shimmer, ShimmerError};
use std::path::{Path, PathBuf};

use super::{expand_path, load_config};

/// Arguments for the `build` command.
///
/// Every flag overrides the matching config file value.
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Project root to scan for images
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Asset directory, relative to the site root (e.g. "assets")
    #[arg(long)]
    pub asset_dir: Option<String>,

    /// Public base path the site is served under (e.g. "/docs/")
    #[arg(short, long = "base")]
    pub base_path: Option<String>,

    /// Directory that receives map.json (cleared on every build)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Number of images processed concurrently
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Pretty-print map.json
    #[arg(long)]
    pub pretty: bool,
}

impl BuildArgs {
    /// Merge the flags over `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(root) = &self.root {
            config.site.root_dir = Some(expand_path(root));
        }
        if let Some(asset_dir) = &self.asset_dir {
            config.site.asset_dir = Some(asset_dir.clone());
        }
        if let Some(base_path) = &self.base_path {
            config.site.base_path = Some(base_path.clone());
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.site.cache_dir = Some(expand_path(cache_dir));
        }
        if let Some(parallel) = self.parallel {
            config.processing.parallel_workers = parallel;
        }
        if self.pretty {
            config.output.pretty = true;
        }
    }
}

/// Execute the build command.
///
/// A config file that fails to parse or validate aborts the build before
/// anything on disk is touched; only a missing default file means defaults.
pub async fn execute(args: BuildArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    build(args, config).await
}

async fn build(args: BuildArgs, mut config: Config) -> anyhow::Result<()> {
    args.apply(&mut config);

    let shimmer = match Shimmer::new(config) {
        Ok(shimmer) => shimmer,
        Err(ShimmerError::Config(ConfigError::Missing(field))) => {
            anyhow::bail!(
                "Missing required setting `{field}`.\n\n  \
                 Hint: pass it as a flag (see `shimmer build --help`) or set it in the config file."
            );
        }
        Err(e) => return Err(e.into()),
    };

    let summary = shimmer.run().await?;
    println!(
        "Generated {} placeholder(s) in {:?} -> {}",
        summary.stats.images,
        summary.stats.elapsed,
        summary.map_path.display()
    );
    Ok(())
}
