//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `download`: Catalog selection and the download pipeline
//! - `resolve`: Resolve one track against the mirrors
//! - `config`: Show or initialize the configuration file

mod config;
mod download;
mod resolve;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::model::MirrorEndpoint;

pub use config::cmd_config;
pub use download::cmd_download;
pub use resolve::cmd_resolve;

/// Mirror Fetch CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Download the most popular catalog tracks for some genres
    Download {
        /// Path to the SQLite catalog
        #[arg(long, env = "MIRROR_FETCH_DB")]
        db: PathBuf,
        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Genre to select; repeat for several (overrides config)
        #[arg(short = 'g', long = "genre")]
        genres: Vec<String>,
        /// Maximum number of tracks, 0 for no limit (overrides config)
        #[arg(short, long)]
        limit: Option<u32>,
        /// Mirror base URL; repeat for several (overrides config)
        #[arg(short = 'm', long = "mirror")]
        mirrors: Vec<String>,
        /// Config file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for the mirror shuffle, for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Resolve a single track to a stream URL
    Resolve {
        /// Track title
        #[arg(long)]
        title: String,
        /// Artist name
        #[arg(long)]
        artist: String,
        /// Catalog id used as the cache key
        #[arg(long)]
        id: String,
        /// Mirror base URL; repeat for several (overrides config)
        #[arg(short = 'm', long = "mirror")]
        mirrors: Vec<String>,
        /// Config file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Download {
            db,
            output,
            genres,
            limit,
            mirrors,
            config,
            seed,
        } => {
            let rt = Runtime::new()?;
            let mut config = load_config(config.as_deref())?;
            if let Some(output) = output {
                config.download.output_dir = output.clone();
            }
            if !genres.is_empty() {
                config.catalog.genres = genres.clone();
            }
            if let Some(limit) = limit {
                config.catalog.limit = *limit;
            }
            override_mirrors(&mut config, mirrors);
            cmd_download(&rt, db, &config, *seed)
        }
        Commands::Resolve {
            title,
            artist,
            id,
            mirrors,
            config,
        } => {
            let rt = Runtime::new()?;
            let mut config = load_config(config.as_deref())?;
            override_mirrors(&mut config, mirrors);
            cmd_resolve(&rt, &config, title, artist, id)
        }
        Commands::Config { init } => cmd_config(*init),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Load config from an explicit file, or the default location.
pub(crate) fn load_config(path: Option<&Path>) -> crate::error::Result<Config> {
    match path {
        Some(path) => Ok(crate::config::load_from(path)?),
        None => Ok(crate::config::load()),
    }
}

fn override_mirrors(config: &mut Config, mirrors: &[String]) {
    if !mirrors.is_empty() {
        config.mirrors.endpoints = mirrors.to_vec();
    }
}

/// Configured endpoints, failing if none are usable.
pub(crate) fn require_endpoints(config: &Config) -> anyhow::Result<Vec<MirrorEndpoint>> {
    let endpoints = config.mirrors.endpoints();
    if endpoints.is_empty() {
        anyhow::bail!("No mirror endpoints configured. Use --mirror or edit the config file.");
    }
    Ok(endpoints)
}
