//! In-memory resolution cache.
//!
//! Keyed by external id. Only successful resolutions are stored; an entry is
//! never evicted for the life of the cache. Each id owns a single-flight slot,
//! so concurrent resolutions of the same id wait for the one in flight
//! instead of hitting the mirrors again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::model::ResolvedLocator;

type Slot = Arc<OnceCell<ResolvedLocator>>;

/// Resolution cache shared by every caller of a resolver.
#[derive(Default)]
pub struct ResolutionCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached locator for `external_id`, without touching the network.
    pub fn get(&self, external_id: &str) -> Option<ResolvedLocator> {
        self.slots
            .lock()
            .get(external_id)
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of cached locators.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached locator, or run `resolve` to produce one.
    ///
    /// At most one `resolve` runs per id at a time. A `None` result is not
    /// cached, so the next caller for that id resolves again. Its slot is
    /// dropped once nobody else is waiting on it.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        external_id: &str,
        resolve: F,
    ) -> Option<ResolvedLocator>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<ResolvedLocator>>,
    {
        let slot = self.slot(external_id);
        let locator = slot
            .get_or_try_init(|| async { resolve().await.ok_or(Unresolved) })
            .await
            .ok()
            .cloned();

        if locator.is_none() {
            self.release(external_id, &slot);
        }
        locator
    }

    /// Remove an empty slot held only by the map and the caller.
    fn release(&self, external_id: &str, slot: &Slot) {
        let mut slots = self.slots.lock();
        let idle = slots.get(external_id).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(slot) == 2
        });
        if idle {
            slots.remove(external_id);
        }
    }

    fn slot(&self, external_id: &str) -> Slot {
        self.slots
            .lock()
            .entry(external_id.to_string())
            .or_default()
            .clone()
    }
}

/// Marker for a resolution that produced nothing.
struct Unresolved;
