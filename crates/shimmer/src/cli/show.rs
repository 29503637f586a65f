//! The `shimmer show` command: print the persisted table.

use clap::Args;
use shimmer_core::{CacheStore, Config, ImageTable};
use std::path::{Path, PathBuf};

use super::{expand_path, load_config};

/// Arguments for the `show` command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Directory holding map.json (defaults to `site.cache_dir` from the config)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Print only the record for this key (path relative to the project root)
    #[arg(short, long)]
    pub key: Option<String>,
}

/// Execute the show command.
pub fn execute(args: ShowArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    show(args, config)
}

fn show(args: ShowArgs, config: Config) -> anyhow::Result<()> {
    let Some(cache_dir) = args.cache_dir.or(config.site.cache_dir) else {
        anyhow::bail!(
            "No cache directory given.\n\n  Hint: pass --cache-dir or set site.cache_dir in the config file."
        );
    };
    let store = CacheStore::new(expand_path(&cache_dir));
    if !store.exists() {
        anyhow::bail!(
            "No map.json found in {}\n\n  Hint: run `shimmer build` first.",
            store.dir().display()
        );
    }

    let table = store.read()?;
    println!("{}", render(&table, args.key.as_deref())?);
    Ok(())
}

/// Render the whole table, or a single record, as pretty JSON.
fn render(table: &ImageTable, key: Option<&str>) -> anyhow::Result<String> {
    match key {
        Some(key) => {
            let Some(record) = table.get(key) else {
                anyhow::bail!("No record for {key:?} ({} record(s) in table)", table.len());
            };
            Ok(serde_json::to_string_pretty(record)?)
        }
        None => Ok(serde_json::to_string_pretty(table)?),
    }
}
