//! Single-track resolution command.

use tokio::runtime::Runtime;

use crate::config::Config;
use crate::mirror::MirrorClient;
use crate::model::TrackQuery;
use crate::resolver::Resolver;

use super::require_endpoints;

/// Resolve one track and print its stream URL.
pub fn cmd_resolve(
    rt: &Runtime,
    config: &Config,
    title: &str,
    artist: &str,
    external_id: &str,
) -> anyhow::Result<()> {
    let endpoints = require_endpoints(config)?;

    rt.block_on(async {
        let client = MirrorClient::new(config.resolver.request_timeout())?
            .with_quality(config.resolver.quality.clone());
        let resolver = Resolver::new(client);
        let query = TrackQuery::new(title, artist, external_id);

        println!("Resolving: {} - {}", artist, title);
        println!("Mirrors:   {}", endpoints.len());
        println!();

        match resolver.resolve(&query, &endpoints).await {
            Some(locator) => {
                println!("✓ {}", locator.url);
            }
            None => {
                println!("✗ Not found on any mirror.");
            }
        }

        Ok(())
    })
}
