//! Audit trail - append-only records of what a download run did.
//!
//! - [`AuditLog`]: timestamped text lines, one per notable event
//! - [`TrackLedger`]: one CSV row per processed track
//!
//! Both files are only ever appended to, so several runs accumulate in the
//! same trail.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt};
use crate::model::CatalogTrack;

/// Ledger header row
pub const LEDGER_HEADER: [&str; 6] = [
    "external_id",
    "title",
    "artist",
    "popularity",
    "status",
    "resolved_url",
];

/// Final status of a track in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Downloaded,
    NotFound,
    Failed,
    RateLimited,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Downloaded => "Downloaded",
            TrackStatus::NotFound => "Not Found",
            TrackStatus::Failed => "Failed",
            TrackStatus::RateLimited => "Rate Limited",
        }
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Append-only timestamped log file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `message` as `[YYYY-MM-DD HH:MM:SS] message`.
    pub fn record(&self, message: &str) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = append(&self.path)
            .with_context(format!("Failed to open log {}", self.path.display()))?;
        writeln!(file, "[{}] {}", timestamp, message)
            .with_context(format!("Failed to write log {}", self.path.display()))
    }

    /// Like [`record`](Self::record), but failures are only traced.
    pub fn note(&self, message: &str) {
        if let Err(e) = self.record(message) {
            tracing::warn!("{}", e);
        }
    }
}

/// Append-only CSV ledger with one row per processed track.
pub struct TrackLedger {
    path: PathBuf,
}

impl TrackLedger {
    /// Open the ledger, writing the header if the file is new.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            let mut file = append(&path)
                .with_context(format!("Failed to create ledger {}", path.display()))?;
            writeln!(file, "{}", csv_row(&LEDGER_HEADER))
                .with_context(format!("Failed to write ledger {}", path.display()))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row for `track`.
    pub fn record(
        &self,
        track: &CatalogTrack,
        status: TrackStatus,
        resolved_url: Option<&str>,
    ) -> Result<()> {
        let popularity = track.popularity.to_string();
        let row = csv_row(&[
            track.external_id.as_str(),
            track.title.as_str(),
            track.artist.as_str(),
            popularity.as_str(),
            status.as_str(),
            resolved_url.unwrap_or(""),
        ]);

        let mut file = append(&self.path)
            .with_context(format!("Failed to open ledger {}", self.path.display()))?;
        writeln!(file, "{}", row)
            .with_context(format!("Failed to write ledger {}", self.path.display()))
    }

    /// Like [`record`](Self::record), but failures are only traced.
    pub fn note(&self, track: &CatalogTrack, status: TrackStatus, resolved_url: Option<&str>) {
        if let Err(e) = self.record(track, status, resolved_url) {
            tracing::warn!("Ledger write failed: {}", e);
        }
    }
}

/// The log and ledger of one run.
pub struct AuditTrail {
    pub log: AuditLog,
    pub ledger: TrackLedger,
}

impl AuditTrail {
    /// Open both sinks; fails only if the ledger cannot be created.
    pub fn open(log_path: impl Into<PathBuf>, ledger_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            log: AuditLog::new(log_path),
            ledger: TrackLedger::open(ledger_path)?,
        })
    }
}

/// Join fields into one CSV line, quoting where needed.
fn csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mock_catalog_track;

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a, b"), "\"a, b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_status_vocabulary() {
        assert_eq!(TrackStatus::Downloaded.to_string(), "Downloaded");
        assert_eq!(TrackStatus::NotFound.to_string(), "Not Found");
        assert_eq!(TrackStatus::RateLimited.to_string(), "Rate Limited");
    }

    #[test]
    fn test_ledger_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");

        let ledger = TrackLedger::open(&path).unwrap();
        ledger
            .record(
                &mock_catalog_track("id1"),
                TrackStatus::Downloaded,
                Some("http://s/1"),
            )
            .unwrap();
        // Reopening an existing ledger must not repeat the header
        let ledger = TrackLedger::open(&path).unwrap();
        ledger
            .record(&mock_catalog_track("id2"), TrackStatus::NotFound, None)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "external_id,title,artist,popularity,status,resolved_url",
                "id1,Song id1,Test Artist,50,Downloaded,http://s/1",
                "id2,Song id2,Test Artist,50,Not Found,",
            ]
        );
    }

    #[test]
    fn test_ledger_quotes_titles() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = TrackLedger::open(dir.path().join("ledger.csv")).unwrap();
        let track = CatalogTrack {
            title: "Hello, World".to_string(),
            ..mock_catalog_track("id3")
        };

        ledger.record(&track, TrackStatus::Failed, None).unwrap();

        let contents = std::fs::read_to_string(ledger.path()).unwrap();
        assert!(contents.contains("id3,\"Hello, World\",Test Artist,50,Failed,"));
    }

    #[test]
    fn test_log_lines_are_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("run.log"));

        log.record("--- Download Session Started ---").unwrap();
        log.note("[Done] Song A");

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            // "[YYYY-MM-DD HH:MM:SS] "
            assert_eq!(line.as_bytes()[0], b'[');
            assert_eq!(&line[20..22], "] ");
        }
        assert!(lines[0].ends_with("--- Download Session Started ---"));
        assert!(lines[1].ends_with("[Done] Song A"));
    }

    #[test]
    fn test_log_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("no").join("such").join("run.log"));
        assert!(log.record("x").is_err());
        // note() swallows the failure
        log.note("x");
    }
}
