//! Resolver - tries mirrors in random order until one yields a locator.
//!
//! # Algorithm
//!
//! 1. A cached locator for the query's external id is returned without any
//!    network access.
//! 2. Otherwise the configured endpoints are shuffled (fresh permutation per
//!    call; the caller's slice is left untouched) and tried one at a time.
//! 3. `Found` is cached and returned. `RateLimited` and `NotFound` move on to
//!    the next mirror. Exhausting the list returns `None`.
//!
//! Mirrors are tried strictly sequentially. There is no back-off here; the
//! download pipeline owns throttling.
//!
//! # Example
//!
//! ```ignore
//! use mirror_fetch::resolver::Resolver;
//!
//! let resolver = Resolver::new(MirrorClient::new(Duration::from_secs(5))?);
//! let locator = resolver.resolve(&query, &endpoints).await;
//! ```

pub mod cache;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::audit::AuditLog;
use crate::mirror::{MirrorApi, MirrorOutcome};
use crate::model::{MirrorEndpoint, ResolvedLocator, TrackQuery};

pub use cache::ResolutionCache;

/// Resolves track queries against a set of mirrors.
///
/// Safe to share between tasks; see [`ResolutionCache`] for the
/// resolve-once-per-id guarantee.
pub struct Resolver<M> {
    mirrors: M,
    cache: ResolutionCache,
    rng: Mutex<StdRng>,
    audit: Option<AuditLog>,
}

impl<M: MirrorApi> Resolver<M> {
    /// Create a resolver that shuffles with OS entropy.
    pub fn new(mirrors: M) -> Self {
        Self::with_rng(mirrors, StdRng::from_os_rng())
    }

    /// Create a resolver with a reproducible mirror order.
    pub fn with_seed(mirrors: M, seed: u64) -> Self {
        Self::with_rng(mirrors, StdRng::seed_from_u64(seed))
    }

    /// Create a resolver with an explicit random source.
    pub fn with_rng(mirrors: M, rng: StdRng) -> Self {
        Self {
            mirrors,
            cache: ResolutionCache::new(),
            rng: Mutex::new(rng),
            audit: None,
        }
    }

    /// Also record rate-limiting mirrors in `log`.
    pub fn with_audit_log(mut self, log: AuditLog) -> Self {
        self.audit = Some(log);
        self
    }

    /// The resolution cache.
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// The mirror implementation.
    pub fn mirrors(&self) -> &M {
        &self.mirrors
    }

    /// Resolve `query` to a stream locator, or `None` if no mirror has it.
    pub async fn resolve(
        &self,
        query: &TrackQuery,
        endpoints: &[MirrorEndpoint],
    ) -> Option<ResolvedLocator> {
        if let Some(locator) = self.cache.get(&query.external_id) {
            debug!(id = %query.external_id, "Resolution cache hit");
            return Some(locator);
        }

        self.cache
            .get_or_resolve(&query.external_id, || self.try_mirrors(query, endpoints))
            .await
    }

    async fn try_mirrors(
        &self,
        query: &TrackQuery,
        endpoints: &[MirrorEndpoint],
    ) -> Option<ResolvedLocator> {
        let order = self.shuffled(endpoints);

        for endpoint in &order {
            match self.mirrors.attempt(query, endpoint).await {
                MirrorOutcome::Found(locator) => {
                    info!(
                        id = %query.external_id,
                        mirror = %endpoint.base_url,
                        "Resolved {}",
                        query.search_text()
                    );
                    return Some(locator);
                }
                MirrorOutcome::RateLimited => {
                    warn!(mirror = %endpoint.base_url, "Mirror is rate limiting, trying next");
                    if let Some(log) = &self.audit {
                        log.note(&format!(
                            "  [429] Instance {} is rate limiting",
                            endpoint.base_url
                        ));
                    }
                }
                MirrorOutcome::NotFound => {
                    debug!(
                        mirror = %endpoint.base_url,
                        id = %query.external_id,
                        "Not found on mirror"
                    );
                }
            }
        }

        debug!(
            id = %query.external_id,
            tried = order.len(),
            "No mirror could resolve {}",
            query.search_text()
        );
        None
    }

    /// A fresh random permutation of `endpoints`.
    fn shuffled(&self, endpoints: &[MirrorEndpoint]) -> Vec<MirrorEndpoint> {
        let mut order = endpoints.to_vec();
        order.shuffle(&mut *self.rng.lock());
        order
    }
}
