//! Mirror HTTP client
//!
//! One attempt is two sequential requests against the same mirror:
//!
//! 1. `GET {base}/search/?s={query}` - pick the first result with an `id`
//! 2. `GET {base}/track/?id={id}&quality={quality}` - fetch and decode the manifest
//!
//! Every failure (network, status, shape, decode) ends the attempt with
//! [`MirrorOutcome::NotFound`]; HTTP 429 ends it with
//! [`MirrorOutcome::RateLimited`]. Nothing is propagated as an error.
//!
//! Only the first identifier in the search results is ever tried. If its
//! manifest is unusable, the mirror is abandoned rather than falling back to
//! the next search result.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::domain::{MirrorError, MirrorOutcome, SearchResult, StreamManifest};
use super::manifest::{decode_manifest, extract_manifest};
use super::normalize::normalize;
use super::transport::{HttpTransport, ReqwestTransport};
use crate::model::{MirrorEndpoint, ResolvedLocator, TrackQuery};

/// Audio tier requested from mirrors unless configured otherwise
pub const DEFAULT_QUALITY: &str = "HIGH";

/// Mirror API client
pub struct MirrorClient<T = ReqwestTransport> {
    transport: T,
    quality: String,
}

/// Why an attempt stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Miss {
    NotFound,
    RateLimited,
}

impl From<Miss> for MirrorOutcome {
    fn from(miss: Miss) -> Self {
        match miss {
            Miss::NotFound => MirrorOutcome::NotFound,
            Miss::RateLimited => MirrorOutcome::RateLimited,
        }
    }
}

impl MirrorClient<ReqwestTransport> {
    /// Create a client whose requests each time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, MirrorError> {
        Ok(Self::with_transport(ReqwestTransport::new(timeout)?))
    }
}

impl<T: HttpTransport> MirrorClient<T> {
    /// Create a client over an arbitrary transport
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            quality: DEFAULT_QUALITY.to_string(),
        }
    }

    /// Request a different audio tier in the manifest fetch
    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    /// The transport this client sends requests through
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Try to resolve `query` on a single mirror.
    pub async fn attempt(&self, query: &TrackQuery, endpoint: &MirrorEndpoint) -> MirrorOutcome {
        match self.try_attempt(query, endpoint).await {
            Ok(locator) => MirrorOutcome::Found(locator),
            Err(miss) => miss.into(),
        }
    }

    async fn try_attempt(
        &self,
        query: &TrackQuery,
        endpoint: &MirrorEndpoint,
    ) -> Result<ResolvedLocator, Miss> {
        let result = self.search(query, endpoint).await?;
        let manifest = self.fetch_manifest(&result, endpoint).await?;

        let urls = decode_manifest(&manifest.encoded_blob).map_err(|e| {
            debug!(mirror = %endpoint.base_url, "Unusable manifest: {}", e);
            Miss::NotFound
        })?;

        // decode_manifest never returns an empty list
        let url = urls.into_iter().next().ok_or(Miss::NotFound)?;
        Ok(ResolvedLocator::new(url))
    }

    /// Step 1: search and pick the first usable track identifier
    async fn search(
        &self,
        query: &TrackQuery,
        endpoint: &MirrorEndpoint,
    ) -> Result<SearchResult, Miss> {
        let url = search_url(endpoint, query);
        let body = self.get_json(&url).await?;

        let records = normalize(&body);
        if records.is_empty() {
            debug!(mirror = %endpoint.base_url, "No search results for {:?}", query.search_text());
            return Err(Miss::NotFound);
        }

        select_track_id(records).ok_or_else(|| {
            debug!(mirror = %endpoint.base_url, "Search results carry no track id");
            Miss::NotFound
        })
    }

    /// Step 2: fetch the track detail and locate its manifest blob
    async fn fetch_manifest(
        &self,
        result: &SearchResult,
        endpoint: &MirrorEndpoint,
    ) -> Result<StreamManifest, Miss> {
        let url = track_url(endpoint, &result.mirror_track_id, &self.quality);
        let body = self.get_json(&url).await?;

        extract_manifest(&body).ok_or_else(|| {
            debug!(
                mirror = %endpoint.base_url,
                track_id = %result.mirror_track_id,
                "Track response has no manifest"
            );
            Miss::NotFound
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, Miss> {
        let response = self.transport.get(url).await.map_err(|e| {
            debug!("GET {} failed: {}", url, e);
            Miss::NotFound
        })?;

        if response.is_rate_limited() {
            return Err(Miss::RateLimited);
        }

        if !response.is_ok() {
            debug!("GET {} returned HTTP {}", url, response.status);
            return Err(Miss::NotFound);
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            debug!("GET {} returned malformed JSON: {}", url, e);
            Miss::NotFound
        })
    }
}

/// Build the search URL for a query.
pub fn search_url(endpoint: &MirrorEndpoint, query: &TrackQuery) -> String {
    format!(
        "{}/search/?s={}",
        endpoint.base_url,
        urlencoding::encode(&query.search_text())
    )
}

/// Build the track-detail URL for a mirror track id.
pub fn track_url(endpoint: &MirrorEndpoint, track_id: &str, quality: &str) -> String {
    format!(
        "{}/track/?id={}&quality={}",
        endpoint.base_url,
        urlencoding::encode(track_id),
        quality
    )
}

/// Pick the first record exposing a usable `id`, unwrapping `item` if present.
///
/// Mirror order is authoritative; nothing is re-ranked.
pub fn select_track_id(records: &[Value]) -> Option<SearchResult> {
    records
        .iter()
        .find_map(|record| {
            let track = record
                .get("item")
                .filter(|inner| inner.is_object())
                .unwrap_or(record);
            track.get("id").and_then(identifier)
        })
        .map(|mirror_track_id| SearchResult { mirror_track_id })
}

/// Non-empty strings and non-zero numbers count as identifiers.
fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}
