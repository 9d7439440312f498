//! Catalog download command.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Runtime;

use crate::audit::AuditTrail;
use crate::catalog;
use crate::config::Config;
use crate::download::{DownloadPipeline, HttpFetcher, PipelineSettings};
use crate::mirror::MirrorClient;
use crate::resolver::Resolver;

use super::require_endpoints;

/// Select the top catalog tracks and download them.
pub fn cmd_download(
    rt: &Runtime,
    db_path: &Path,
    config: &Config,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let endpoints = require_endpoints(config)?;

    rt.block_on(async {
        let pool = catalog::open(db_path).await?;
        let genres = catalog::normalize_genres(&config.catalog.genres);

        let matching = catalog::count_matching(&pool, &genres).await?;
        println!(
            "Found {} tracks matching genres: {}",
            matching,
            genres.join(", ")
        );

        let tracks = catalog::top_tracks(&pool, &genres, config.catalog.limit).await?;
        pool.close().await;

        if tracks.is_empty() {
            println!("Nothing to download.");
            return Ok(());
        }

        let client = MirrorClient::new(config.resolver.request_timeout())?
            .with_quality(config.resolver.quality.clone());
        let audit = AuditTrail::open(&config.audit.log_file, &config.audit.ledger_file)?;
        let resolver = match seed {
            Some(seed) => Resolver::with_seed(client, seed),
            None => Resolver::new(client),
        }
        .with_audit_log(audit.log.clone());
        let fetcher = HttpFetcher::new(
            config.resolver.request_timeout(),
            config.download.stall_timeout(),
        )?;

        let pipeline = DownloadPipeline::new(
            resolver,
            fetcher,
            endpoints,
            PipelineSettings::from(&config.download),
            audit,
        );

        let interrupt = Arc::new(AtomicBool::new(false));
        tokio::spawn(listen_for_interrupt(interrupt.clone()));

        println!(
            "Downloading {} tracks to {}",
            tracks.len(),
            config.download.output_dir.display()
        );
        println!();

        let summary = pipeline.run(&tracks, &interrupt).await?;

        println!();
        println!("Download Summary");
        println!("================");
        println!("  ✓ Downloaded:   {}", summary.downloaded);
        println!("  ? Not found:    {}", summary.not_found);
        println!("  ✗ Failed:       {}", summary.failed);
        println!("  ⏸ Rate limited: {}", summary.rate_limited);
        println!("  → Skipped:      {}", summary.skipped);
        if summary.duplicates > 0 {
            println!("  Duplicates:     {}", summary.duplicates);
        }
        if summary.interrupted {
            println!();
            println!("Stopped early. Run again to continue where it left off.");
        }
        println!();
        println!("Log:    {}", config.audit.log_file.display());
        println!("Ledger: {}", config.audit.ledger_file.display());

        Ok(())
    })
}

/// What a Ctrl-C does, given how many were received before it.
#[derive(Debug, PartialEq, Eq)]
enum InterruptAction {
    /// Finish the current track, then stop
    Stop,
    /// Exit right away
    Exit,
}

fn interrupt_action(previous: usize) -> InterruptAction {
    if previous == 0 {
        InterruptAction::Stop
    } else {
        InterruptAction::Exit
    }
}

/// Set `flag` on the first Ctrl-C; exit the process on the second.
async fn listen_for_interrupt(flag: Arc<AtomicBool>) {
    let mut received = 0;
    while tokio::signal::ctrl_c().await.is_ok() {
        match interrupt_action(received) {
            InterruptAction::Stop => {
                eprintln!(
                    "\nInterrupt received, stopping after the current track \
                     (press Ctrl-C again to quit now)..."
                );
                flag.store(true, Ordering::SeqCst);
            }
            InterruptAction::Exit => {
                eprintln!("\nAborted.");
                std::process::exit(130);
            }
        }
        received += 1;
    }
}
