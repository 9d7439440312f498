//! Download pipeline - resolves catalog tracks and saves their audio.
//!
//! # Architecture
//!
//! - **Fetcher** (`fetcher.rs`) - streams one locator to disk via reqwest
//! - **Pipeline** (`pipeline.rs`) - per-track flow: skip, resolve, fetch,
//!   rate-limit pause, audit
//!
//! Output files are named from the sanitized title and the external id, so
//! names never collide and re-runs skip what is already on disk.

pub mod fetcher;
pub mod pipeline;

use std::path::PathBuf;

pub use fetcher::{AudioFetcher, FetchOutcome, HttpFetcher};
pub use pipeline::{DownloadPipeline, PipelineSettings, RunSummary};

/// Extension given to saved audio files
pub const AUDIO_EXTENSION: &str = "mp3";

/// Errors while saving one track. Never fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("No data received for {0:?}")]
    Stalled(std::time::Duration),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Output filename for a track: `"{title} - {external_id}.mp3"`.
///
/// Only alphanumerics, spaces and `.-_()` survive sanitizing.
pub fn track_filename(title: &str, external_id: &str) -> String {
    let title = sanitize(title);
    let title = if title.is_empty() { "Unknown" } else { &title };
    format!("{} - {}.{}", title, sanitize(external_id), AUDIO_EXTENSION)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '-' | '_' | '(' | ')'))
        .collect::<String>()
        .trim()
        .to_string()
}
