//! Core data models shared by the resolver, catalog and download pipeline.
//!
//! Defines the primary entities: [`TrackQuery`], [`MirrorEndpoint`],
//! [`ResolvedLocator`] and [`CatalogTrack`].
//!
//! # Catalog Schema
//!
//! [`CatalogTrack`] is read from the following tables of a pre-existing catalog:
//! - `tracks` - track rows with stable external `id`, `name` and `popularity`
//! - `artists` - artist rows keyed by `rowid`
//! - `track_artists` / `artist_genres` - join tables used for genre filtering

use sqlx::FromRow;

/// A track to resolve against the mirrors.
///
/// Built once per resolution attempt and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    /// Track title
    pub title: String,
    /// Primary artist name
    pub artist: String,
    /// Stable identifier from the source catalog (cache key)
    pub external_id: String,
}

impl TrackQuery {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        external_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            external_id: external_id.into(),
        }
    }

    /// Free-text search string sent to mirrors: title and artist, space-joined.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.artist)
    }
}

/// One configured mirror service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MirrorEndpoint {
    /// Base URL without a trailing slash
    pub base_url: String,
}

impl MirrorEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// A directly fetchable audio stream address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocator {
    pub url: String,
}

impl ResolvedLocator {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// A row from the source catalog.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CatalogTrack {
    /// Track title
    pub title: String,
    /// Stable external identifier
    pub external_id: String,
    /// Popularity score (higher is more popular)
    pub popularity: i64,
    /// Artist name (empty if the catalog has none)
    pub artist: String,
}

impl CatalogTrack {
    /// The query used to resolve this row.
    pub fn query(&self) -> TrackQuery {
        TrackQuery::new(&self.title, &self.artist, &self.external_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_text_joins_title_and_artist() {
        let query = TrackQuery::new("Song A", "Artist X", "id1");
        assert_eq!(query.search_text(), "Song A Artist X");
    }

    #[test]
    fn test_endpoint_trims_trailing_slashes() {
        assert_eq!(
            MirrorEndpoint::new("https://mirror.example/").base_url,
            "https://mirror.example"
        );
        assert_eq!(
            MirrorEndpoint::new("https://mirror.example").base_url,
            "https://mirror.example"
        );
    }

    #[test]
    fn test_catalog_track_query() {
        let track = CatalogTrack {
            title: "Song".to_string(),
            external_id: "abc".to_string(),
            popularity: 70,
            artist: "Band".to_string(),
        };
        assert_eq!(track.query(), TrackQuery::new("Song", "Band", "abc"));
    }
}
