//! Audio fetcher - saves the bytes behind a resolved locator.
//!
//! The body is streamed into `<file>.part` and renamed into place once
//! complete, so an interrupted download never looks like a finished file
//! to the next run. A body that stops arriving for longer than the stall
//! timeout is abandoned.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};

use super::DownloadError;

/// User agent sent to stream hosts
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// How a fetch ended when no error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// File written; `bytes` is its size
    Saved { bytes: u64 },
    /// HTTP 429 from the stream host
    RateLimited,
    /// Any other non-success status
    Failed { status: u16 },
}

/// Trait for saving a stream locator to disk.
///
/// Implement this trait to create mock implementations for testing.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, DownloadError>;
}

/// reqwest-backed fetcher.
pub struct HttpFetcher {
    http_client: reqwest::Client,
    stall_timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher.
    ///
    /// The whole transfer is not bounded, since large files may take a
    /// while. Connecting is bounded by `connect_timeout`, and each chunk of
    /// the body must arrive within `stall_timeout`.
    pub fn new(connect_timeout: Duration, stall_timeout: Duration) -> Result<Self, DownloadError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| DownloadError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            stall_timeout,
        })
    }
}

#[async_trait]
impl AudioFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, DownloadError> {
        let request = self.http_client.get(url).send();
        let response = tokio::time::timeout(self.stall_timeout, request)
            .await
            .map_err(|_| DownloadError::Stalled(self.stall_timeout))?
            .map_err(|e| DownloadError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Ok(FetchOutcome::RateLimited);
        }

        if !status.is_success() {
            return Ok(FetchOutcome::Failed {
                status: status.as_u16(),
            });
        }

        let part = part_path(dest);
        match write_stream(response, &part, self.stall_timeout).await {
            Ok(bytes) => {
                tokio::fs::rename(&part, dest)
                    .await
                    .map_err(|e| DownloadError::io(dest, e))?;
                Ok(FetchOutcome::Saved { bytes })
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}

async fn write_stream(
    response: reqwest::Response,
    path: &Path,
    stall_timeout: Duration,
) -> Result<u64, DownloadError> {
    let file = tokio::fs::File::create(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    let mut writer = BufWriter::with_capacity(64 * 1024, file);
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    loop {
        let next = tokio::time::timeout(stall_timeout, stream.next())
            .await
            .map_err(|_| DownloadError::Stalled(stall_timeout))?;
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| DownloadError::Stream(e.to_string()))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| DownloadError::io(path, e))?;
    Ok(written)
}

/// `song.mp3` -> `song.mp3.part`
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    dest.with_file_name(name)
}

/// Mock fetchers for testing.
#[cfg(test)]
pub mod mocks {
    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;

    /// Fetcher answering from a queue of outcomes.
    ///
    /// `Saved` writes `bytes` zero bytes to the destination. Once the queue
    /// is empty every fetch is saved with 16 bytes.
    #[derive(Default)]
    pub struct MockFetcher {
        outcomes: Mutex<VecDeque<FetchOutcome>>,
        fetched: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_outcomes(outcomes: impl IntoIterator<Item = FetchOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().collect()),
                fetched: Mutex::new(Vec::new()),
            }
        }

        /// URLs fetched so far, in order.
        pub fn fetched(&self) -> Vec<String> {
            self.fetched.lock().clone()
        }
    }

    #[async_trait]
    impl AudioFetcher for MockFetcher {
        async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, DownloadError> {
            self.fetched.lock().push(url.to_string());
            let outcome = self
                .outcomes
                .lock()
                .pop_front()
                .unwrap_or(FetchOutcome::Saved { bytes: 16 });

            if let FetchOutcome::Saved { bytes } = outcome {
                tokio::fs::write(dest, vec![0u8; bytes as usize])
                    .await
                    .map_err(|e| DownloadError::io(dest, e))?;
            }
            Ok(outcome)
        }
    }
}
