//! Command-line interface for mirror-fetch.
//!
//! This module provides CLI commands for downloading catalog tracks,
//! resolving a single track and inspecting the configuration.

mod commands;

pub use commands::{Cli, Commands, run_command};
