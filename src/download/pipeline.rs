//! Download pipeline - the per-track loop around the resolver.
//!
//! For each catalog track, in order:
//! 1. Skip duplicates of an external id already seen this run
//! 2. Skip tracks whose output file already exists (no resolution)
//! 3. Resolve a locator; none means `Not Found` in the ledger
//! 4. Fetch; HTTP 429 pauses and retries the same track a bounded number of
//!    times
//! 5. Sleep a random jitter before the next track
//!
//! Per-track failures are logged and the run moves on. The interrupt flag
//! is only checked between tracks.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use super::fetcher::{AudioFetcher, FetchOutcome};
use super::track_filename;
use crate::audit::{AuditTrail, TrackStatus};
use crate::config::DownloadConfig;
use crate::error::{Result, ResultExt};
use crate::mirror::MirrorApi;
use crate::model::{CatalogTrack, MirrorEndpoint};
use crate::resolver::Resolver;

/// Pipeline tuning, usually derived from [`DownloadConfig`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Where audio files are written
    pub output_dir: PathBuf,
    /// Pause after a rate-limited download
    pub rate_limit_pause: Duration,
    /// Retries of one track after rate limiting
    pub max_rate_limit_retries: u32,
    /// Bounds of the random pause between processed tracks
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl From<&DownloadConfig> for PipelineSettings {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            rate_limit_pause: Duration::from_secs(config.rate_limit_pause_secs),
            max_rate_limit_retries: config.max_rate_limit_retries,
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

/// Counts from one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: usize,
    pub not_found: usize,
    pub failed: usize,
    pub rate_limited: usize,
    /// Already on disk
    pub skipped: usize,
    /// Repeated external ids
    pub duplicates: usize,
    /// Stopped early by the user
    pub interrupted: bool,
}

impl RunSummary {
    fn count(&mut self, status: TrackStatus) {
        match status {
            TrackStatus::Downloaded => self.downloaded += 1,
            TrackStatus::NotFound => self.not_found += 1,
            TrackStatus::Failed => self.failed += 1,
            TrackStatus::RateLimited => self.rate_limited += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} not found, {} failed, {} rate limited, {} skipped",
            self.downloaded, self.not_found, self.failed, self.rate_limited, self.skipped
        )?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}

/// Resolves and downloads catalog tracks one at a time.
pub struct DownloadPipeline<M, F> {
    resolver: Resolver<M>,
    fetcher: F,
    endpoints: Vec<MirrorEndpoint>,
    settings: PipelineSettings,
    audit: AuditTrail,
}

impl<M: MirrorApi, F: AudioFetcher> DownloadPipeline<M, F> {
    pub fn new(
        resolver: Resolver<M>,
        fetcher: F,
        endpoints: Vec<MirrorEndpoint>,
        settings: PipelineSettings,
        audit: AuditTrail,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            endpoints,
            settings,
            audit,
        }
    }

    pub fn resolver(&self) -> &Resolver<M> {
        &self.resolver
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Process `tracks` in order until done or `interrupt` is set.
    ///
    /// # Errors
    ///
    /// Only if the output directory cannot be created. Everything that goes
    /// wrong for a single track is recorded and skipped.
    pub async fn run(&self, tracks: &[CatalogTrack], interrupt: &AtomicBool) -> Result<RunSummary> {
        tokio::fs::create_dir_all(&self.settings.output_dir)
            .await
            .with_context(format!(
                "Could not create output directory {}",
                self.settings.output_dir.display()
            ))?;

        self.audit.log.note("--- Download Session Started ---");

        let mut summary = RunSummary::default();
        let mut seen = HashSet::new();
        let total = tracks.len();

        for (i, track) in tracks.iter().enumerate() {
            if interrupt.load(Ordering::SeqCst) {
                info!("Stopped by user");
                summary.interrupted = true;
                break;
            }

            if !seen.insert(track.external_id.as_str()) {
                summary.duplicates += 1;
                continue;
            }

            let path = self
                .settings
                .output_dir
                .join(track_filename(&track.title, &track.external_id));

            if path.exists() {
                info!("[{}/{}] [Skip] {} (file exists)", i + 1, total, track.title);
                summary.skipped += 1;
                continue;
            }

            info!(
                "[{}/{}] Processing: {} - {} (Pop: {})",
                i + 1,
                total,
                track.title,
                track.artist,
                track.popularity
            );

            let status = self.process(track, &path).await;
            summary.count(status);

            self.pause_between_tracks().await;
        }

        self.audit
            .log
            .note(&format!("--- Download Session Finished: {} ---", summary));
        Ok(summary)
    }

    /// Resolve and fetch one track, recording the result.
    async fn process(&self, track: &CatalogTrack, path: &Path) -> TrackStatus {
        let Some(locator) = self.resolver.resolve(&track.query(), &self.endpoints).await else {
            info!("    [Skip] {} not found on any mirror", track.title);
            self.audit.ledger.note(track, TrackStatus::NotFound, None);
            return TrackStatus::NotFound;
        };

        let mut retries = 0;
        let status = loop {
            match self.fetcher.fetch(&locator.url, path).await {
                Ok(FetchOutcome::Saved { bytes }) => {
                    self.audit.log.note(&format!("  [Done] {}", track.title));
                    info!("    [Done] {} ({} bytes)", track.title, bytes);
                    break TrackStatus::Downloaded;
                }
                Ok(FetchOutcome::RateLimited) if retries < self.settings.max_rate_limit_retries => {
                    retries += 1;
                    warn!(
                        "    [429] Rate limit. Pausing {}s before retry {}/{}",
                        self.settings.rate_limit_pause.as_secs(),
                        retries,
                        self.settings.max_rate_limit_retries
                    );
                    tokio::time::sleep(self.settings.rate_limit_pause).await;
                }
                Ok(FetchOutcome::RateLimited) => {
                    warn!("    [429] Still rate limited, giving up on {}", track.title);
                    self.audit
                        .log
                        .note(&format!("  [429] Gave up on {}", track.title));
                    break TrackStatus::RateLimited;
                }
                Ok(FetchOutcome::Failed { status }) => {
                    warn!("    [Fail] HTTP {}", status);
                    self.audit
                        .log
                        .note(&format!("  [Fail] {}: HTTP {}", track.title, status));
                    break TrackStatus::Failed;
                }
                Err(e) => {
                    warn!("    [Error] {}", e);
                    self.audit
                        .log
                        .note(&format!("  [Error] {}: {}", track.title, e));
                    break TrackStatus::Failed;
                }
            }
        };

        let url = (status == TrackStatus::Downloaded).then_some(locator.url.as_str());
        self.audit.ledger.note(track, status, url);
        status
    }

    async fn pause_between_tracks(&self) {
        let (low, high) = if self.settings.min_delay <= self.settings.max_delay {
            (self.settings.min_delay, self.settings.max_delay)
        } else {
            (self.settings.max_delay, self.settings.min_delay)
        };

        if high.is_zero() {
            return;
        }

        let delay = rand::rng().random_range(low..=high);
        tokio::time::sleep(delay).await;
    }
}
