//! Test utilities and fixtures for mirror-fetch tests.
//!
//! This module provides a throwaway catalog database, a scripted HTTP
//! transport and manifest helpers to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use mirror_fetch::test_utils::{temp_catalog, insert_catalog_track};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_catalog().await;
//!     insert_catalog_track(&pool, "id1", "Song", 50, "Artist", &["pop"]).await;
//!     // ... test logic
//! }
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use parking_lot::Mutex;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tempfile::TempDir;

use crate::mirror::{HttpResponse, HttpTransport, MirrorError};
use crate::model::CatalogTrack;

/// Catalog schema: the subset of tables the catalog queries touch.
const CATALOG_SCHEMA: &[&str] = &[
    "CREATE TABLE tracks (id TEXT NOT NULL, name TEXT, popularity INTEGER)",
    "CREATE TABLE artists (name TEXT)",
    "CREATE TABLE track_artists (track_rowid INTEGER, artist_rowid INTEGER)",
    "CREATE TABLE artist_genres (artist_rowid INTEGER, genre TEXT)",
];

/// Creates a temporary catalog database with the expected schema.
///
/// Keep the returned `TempDir` alive for the duration of your test; the
/// database is deleted when it is dropped. The file is at
/// `dir.path().join("catalog.sqlite3")`.
pub async fn temp_catalog() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("catalog.sqlite3"))
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options)
        .await
        .expect("Failed to create test catalog");

    for statement in CATALOG_SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Failed to create catalog schema");
    }

    (pool, dir)
}

/// Inserts a track, its artist and the artist's genres into a test catalog.
pub async fn insert_catalog_track(
    pool: &SqlitePool,
    external_id: &str,
    title: &str,
    popularity: i64,
    artist: &str,
    genres: &[&str],
) {
    let track_rowid = sqlx::query("INSERT INTO tracks (id, name, popularity) VALUES (?, ?, ?)")
        .bind(external_id)
        .bind(title)
        .bind(popularity)
        .execute(pool)
        .await
        .expect("Failed to insert track")
        .last_insert_rowid();

    let artist_rowid = sqlx::query("INSERT INTO artists (name) VALUES (?)")
        .bind(artist)
        .execute(pool)
        .await
        .expect("Failed to insert artist")
        .last_insert_rowid();

    sqlx::query("INSERT INTO track_artists (track_rowid, artist_rowid) VALUES (?, ?)")
        .bind(track_rowid)
        .bind(artist_rowid)
        .execute(pool)
        .await
        .expect("Failed to link artist");

    for genre in genres {
        sqlx::query("INSERT INTO artist_genres (artist_rowid, genre) VALUES (?, ?)")
            .bind(artist_rowid)
            .bind(*genre)
            .execute(pool)
            .await
            .expect("Failed to insert genre");
    }
}

/// Creates a mock CatalogTrack with the given id.
pub fn mock_catalog_track(external_id: &str) -> CatalogTrack {
    CatalogTrack {
        title: format!("Song {}", external_id),
        external_id: external_id.to_string(),
        popularity: 50,
        artist: "Test Artist".to_string(),
    }
}

/// Base64 manifest blob carrying `urls`, shaped like a real mirror manifest.
pub fn encode_manifest(urls: &[&str]) -> String {
    let document = serde_json::json!({
        "mimeType": "audio/mp4",
        "codecs": "mp4a.40.2",
        "encryptionType": "NONE",
        "urls": urls,
    });
    STANDARD.encode(document.to_string())
}

/// HTTP transport answering from a URL -> response script.
///
/// Unscripted URLs fail like a refused connection. Every request is
/// recorded in order.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with HTTP 200 and a JSON body.
    pub fn respond_json(&self, url: &str, body: Value) {
        self.respond_raw(url, 200, body.to_string().as_bytes());
    }

    /// Answer `url` with an empty body and `status`.
    pub fn respond_status(&self, url: &str, status: u16) {
        self.respond_raw(url, status, b"");
    }

    /// Answer `url` with an arbitrary status and body.
    pub fn respond_raw(&self, url: &str, status: u16, body: &[u8]) {
        self.responses.lock().insert(
            url.to_string(),
            HttpResponse {
                status,
                body: body.to_vec(),
            },
        );
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, MirrorError> {
        self.requests.lock().push(url.to_string());
        self.responses
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| MirrorError::Network(format!("connection refused: {}", url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_catalog_has_schema() {
        let (pool, _dir) = temp_catalog().await;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_scripted_transport() {
        let transport = ScriptedTransport::new();
        transport.respond_status("http://a", 429);

        assert_eq!(transport.get("http://a").await.unwrap().status, 429);
        assert!(transport.get("http://b").await.is_err());
        assert_eq!(transport.requests(), vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_encode_manifest_is_base64_json() {
        let blob = encode_manifest(&["http://x"]);
        let decoded = STANDARD.decode(blob).unwrap();
        let value: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value["urls"][0], "http://x");
    }

    #[test]
    fn test_mock_catalog_track() {
        let track = mock_catalog_track("abc");
        assert_eq!(track.external_id, "abc");
        assert_eq!(track.title, "Song abc");
    }
}
