//! Catalog module - reads candidate tracks from a pre-existing SQLite catalog.
//!
//! Uses SQLx with SQLite. The catalog is opened read-only; nothing here ever
//! writes to it. Provides:
//! - Counting tracks whose artists carry any of a set of genres
//! - Fetching the most popular such tracks, bounded by a row limit
//!
//! # Example
//!
//! ```ignore
//! use mirror_fetch::catalog;
//!
//! let pool = catalog::open(Path::new("spotify.sqlite3")).await?;
//! let tracks = catalog::top_tracks(&pool, &["filmi".to_string()], 100).await?;
//! ```

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::{Error, Result, ResultExt};
use crate::model::CatalogTrack;

/// Genres selected when none usable are given
pub const DEFAULT_GENRES: [&str; 3] = ["bollywood", "filmi", "desi pop"];

/// Open the catalog at `path` read-only.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be opened as SQLite.
pub async fn open(path: &Path) -> Result<SqlitePool> {
    if !path.is_file() {
        return Err(Error::not_found(path));
    }

    let options = SqliteConnectOptions::new().filename(path).read_only(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(format!("Failed to open catalog {}", path.display()))
}

/// Normalize user-supplied genres: trimmed, lower-cased, empties dropped.
///
/// If nothing is left, [`DEFAULT_GENRES`] is used instead.
pub fn normalize_genres<S: AsRef<str>>(genres: &[S]) -> Vec<String> {
    let normalized: Vec<String> = genres
        .iter()
        .map(|g| g.as_ref().trim().to_lowercase())
        .filter(|g| !g.is_empty())
        .collect();

    if normalized.is_empty() {
        DEFAULT_GENRES.iter().map(|g| g.to_string()).collect()
    } else {
        normalized
    }
}

/// Count distinct tracks whose artists carry any of `genres`.
pub async fn count_matching(pool: &SqlitePool, genres: &[String]) -> Result<i64> {
    if genres.is_empty() {
        return Ok(0);
    }

    let sql = format!(
        r#"
        SELECT COUNT(DISTINCT t.id)
        FROM tracks t
        JOIN track_artists ta ON t.rowid = ta.track_rowid
        JOIN artists a ON ta.artist_rowid = a.rowid
        JOIN artist_genres ag ON a.rowid = ag.artist_rowid
        WHERE ag.genre IN ({})
        "#,
        placeholders(genres.len())
    );

    let mut query = sqlx::query_as::<_, (i64,)>(&sql);
    for genre in genres {
        query = query.bind(genre);
    }

    let (count,) = query
        .fetch_one(pool)
        .await
        .with_context("Could not count catalog tracks (is this the expected catalog schema?)")?;
    Ok(count)
}

/// The most popular tracks for `genres`, most popular first.
///
/// A `limit` of 0 means no limit. A track with several matching artists
/// appears once per artist; callers dedupe by external id.
pub async fn top_tracks(
    pool: &SqlitePool,
    genres: &[String],
    limit: u32,
) -> Result<Vec<CatalogTrack>> {
    if genres.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"
        SELECT DISTINCT
            COALESCE(t.name, '') AS title,
            t.id AS external_id,
            COALESCE(t.popularity, 0) AS popularity,
            COALESCE((SELECT name FROM artists WHERE rowid = ta.artist_rowid), '') AS artist
        FROM tracks t
        JOIN track_artists ta ON t.rowid = ta.track_rowid
        JOIN artists a ON ta.artist_rowid = a.rowid
        JOIN artist_genres ag ON a.rowid = ag.artist_rowid
        WHERE ag.genre IN ({})
        ORDER BY t.popularity DESC
        LIMIT ?
        "#,
        placeholders(genres.len())
    );

    let mut query = sqlx::query_as::<_, CatalogTrack>(&sql);
    for genre in genres {
        query = query.bind(genre);
    }
    // SQLite treats a negative LIMIT as unbounded
    let limit = if limit == 0 { -1 } else { i64::from(limit) };

    query
        .bind(limit)
        .fetch_all(pool)
        .await
        .with_context("Could not query catalog tracks (is this the expected catalog schema?)")
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_catalog_track, temp_catalog};

    fn genres(list: &[&str]) -> Vec<String> {
        list.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_normalize_genres() {
        assert_eq!(
            normalize_genres(&[" Pop ", "", "Desi Pop", "  "]),
            vec!["pop".to_string(), "desi pop".to_string()]
        );
    }

    #[test]
    fn test_blank_genres_fall_back_to_defaults() {
        let empty: [&str; 0] = [];
        assert_eq!(normalize_genres(&empty), genres(&DEFAULT_GENRES));
        assert_eq!(normalize_genres(&[" ", ""]), genres(&DEFAULT_GENRES));
    }

    #[tokio::test]
    async fn test_blank_genre_selects_default_tracks() {
        let (pool, _dir) = temp_catalog().await;
        insert_catalog_track(&pool, "t1", "Film Song", 70, "Artist A", &["filmi"]).await;
        insert_catalog_track(&pool, "t2", "Jazz Song", 80, "Artist B", &["jazz"]).await;

        let selected = normalize_genres(&[" "]);
        let tracks = top_tracks(&pool, &selected, 0).await.unwrap();

        assert_eq!(count_matching(&pool, &selected).await.unwrap(), 1);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].external_id, "t1");
    }

    #[tokio::test]
    async fn test_top_tracks_filters_and_sorts() {
        let (pool, _dir) = temp_catalog().await;
        insert_catalog_track(&pool, "t1", "Quiet Song", 10, "Artist A", &["filmi"]).await;
        insert_catalog_track(&pool, "t2", "Big Hit", 90, "Artist B", &["bollywood"]).await;
        insert_catalog_track(&pool, "t3", "Rock Song", 95, "Artist C", &["rock"]).await;
        insert_catalog_track(
            &pool,
            "t4",
            "Mid Song",
            50,
            "Artist D",
            &["filmi", "desi pop"],
        )
        .await;

        let tracks = top_tracks(&pool, &genres(&["filmi", "bollywood"]), 0)
            .await
            .unwrap();

        let ids: Vec<_> = tracks.iter().map(|t| t.external_id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t4", "t1"]);
        assert_eq!(tracks[0].title, "Big Hit");
        assert_eq!(tracks[0].artist, "Artist B");
        assert_eq!(tracks[0].popularity, 90);
    }

    #[tokio::test]
    async fn test_top_tracks_respects_limit() {
        let (pool, _dir) = temp_catalog().await;
        for i in 0..5 {
            insert_catalog_track(&pool, &format!("t{i}"), "Song", i, "Artist", &["pop"]).await;
        }

        let tracks = top_tracks(&pool, &genres(&["pop"]), 2).await.unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].external_id, "t4");
        assert_eq!(tracks[1].external_id, "t3");
    }

    #[tokio::test]
    async fn test_count_matching() {
        let (pool, _dir) = temp_catalog().await;
        insert_catalog_track(&pool, "t1", "A", 1, "X", &["pop", "dance"]).await;
        insert_catalog_track(&pool, "t2", "B", 2, "Y", &["pop"]).await;
        insert_catalog_track(&pool, "t3", "C", 3, "Z", &["jazz"]).await;

        assert_eq!(count_matching(&pool, &genres(&["pop", "dance"])).await.unwrap(), 2);
        assert_eq!(count_matching(&pool, &genres(&["metal"])).await.unwrap(), 0);
        assert_eq!(count_matching(&pool, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = open(&dir.path().join("missing.sqlite3")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_wrong_schema_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.sqlite3");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let writable = SqlitePool::connect_with(options).await.unwrap();
        sqlx::query("CREATE TABLE songs (title TEXT)")
            .execute(&writable)
            .await
            .unwrap();
        writable.close().await;

        let pool = open(&path).await.unwrap();
        let result = top_tracks(&pool, &genres(&["pop"]), 10).await;

        assert!(matches!(result, Err(Error::WithContext { .. })));
    }
}
