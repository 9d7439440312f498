//! Outcomes and intermediate records of a single mirror attempt.

use crate::model::ResolvedLocator;

/// Result of asking one mirror to resolve one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// The mirror produced a playable locator
    Found(ResolvedLocator),
    /// Nothing usable on this mirror; try the next one
    NotFound,
    /// The mirror answered HTTP 429; skip it for this attempt
    RateLimited,
}

/// Track identifier picked from a mirror's search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub mirror_track_id: String,
}

/// Encoded manifest blob fetched for a [`SearchResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamManifest {
    pub encoded_blob: String,
}

/// Transport-level failures. These never leave the mirror client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MirrorError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for MirrorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MirrorError::Timeout(e.to_string())
        } else if e.is_body() || e.is_decode() {
            MirrorError::Body(e.to_string())
        } else {
            MirrorError::Network(e.to_string())
        }
    }
}
