//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while the CLI
//! and `main` use `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum, for failures that stop a run
//! - Module-specific errors (e.g., [`ConfigError`],
//!   [`DownloadError`](crate::download::DownloadError)) for detailed handling
//! - Per-mirror failures are not errors at all; see
//!   [`MirrorOutcome`](crate::mirror::MirrorOutcome)
//!
//! # Example
//!
//! ```ignore
//! use mirror_fetch::error::{Result, ResultExt};
//!
//! async fn load(path: &Path) -> Result<Vec<CatalogTrack>> {
//!     let pool = catalog::open(path).await?;
//!     catalog::top_tracks(&pool, &genres, 100).await
//! }
//! ```

use std::path::PathBuf;

use crate::config::ConfigError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File not found
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("/data/catalog.sqlite3");
        assert!(err.to_string().contains("/data/catalog.sqlite3"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::not_found("catalog.sqlite3").context("while opening catalog");
        let msg = err.to_string();
        assert!(msg.contains("while opening catalog"));
        assert!(msg.contains("catalog.sqlite3"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: Error = ConfigError::NoConfigDir.into();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_result_ext() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("disk full"));
        let with_ctx = result.with_context("writing ledger");
        let msg = with_ctx.unwrap_err().to_string();
        assert!(msg.contains("writing ledger"));
        assert!(msg.contains("disk full"));
    }
}
