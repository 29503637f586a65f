//! Shimmer CLI - build-time image placeholders for static sites.
//!
//! Shimmer scans a project for JPEG and PNG images and writes a `map.json`
//! with a ThumbHash signature, a tiny preview data URL, and the public URLs of
//! every image, so pages can show a blurred preview while the real image loads.
//!
//! # Usage
//!
//! ```bash
//! # Generate placeholders for a site
//! shimmer build --root ./site --asset-dir assets --base /docs/ --cache-dir ./site/.cache/shimmer
//!
//! # Inspect the generated table
//! shimmer show --cache-dir ./site/.cache/shimmer --key images/a.jpg
//!
//! # View configuration
//! shimmer config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Shimmer - build-time image placeholders for static sites.
#[derive(Parser, Debug)]
#[command(name = "shimmer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true, env = "SHIMMER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate placeholders for every image and write map.json
    Build(cli::build::BuildArgs),

    /// Print the persisted placeholder table
    Show(cli::show::ShowArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    // Commands load the config again and fail on errors; this copy only
    // drives the log level and format.
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e:#}\n  \
                 Using default logging settings. Check your config file with `shimmer config path`."
            );
            shimmer_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Shimmer v{}", shimmer_core::VERSION);

    match cli.command {
        Commands::Build(args) => cli::build::execute(args, cli.config.as_deref()).await,
        Commands::Show(args) => cli::show::execute(args, cli.config.as_deref()),
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref()),
    }
}
