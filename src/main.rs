//! Mirror Fetch - resolves catalog tracks to stream URLs across a pool of
//! community mirrors and downloads them.
//!
//! Tracks are selected from a local SQLite catalog by genre and popularity.
//! Each track is looked up on the mirrors in a random order, the first
//! usable stream locator wins, and the result is written to disk with an
//! audit trail of what happened.

pub mod audit;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod mirror;
pub mod model;
pub mod resolver;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("mirror_fetch=info".parse()?))
        .init();

    cli::run_command(&args)
}
