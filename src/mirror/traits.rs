//! Trait definitions for mirror lookups.
//!
//! The resolver only depends on [`MirrorApi`], so tests can substitute
//! scripted mirrors without any HTTP.

use async_trait::async_trait;

use super::client::MirrorClient;
use super::domain::MirrorOutcome;
use super::transport::HttpTransport;
use crate::model::{MirrorEndpoint, TrackQuery};

/// One attempt to resolve a query on one mirror.
#[async_trait]
pub trait MirrorApi: Send + Sync {
    async fn attempt(&self, query: &TrackQuery, endpoint: &MirrorEndpoint) -> MirrorOutcome;
}

#[async_trait]
impl<T: HttpTransport> MirrorApi for MirrorClient<T> {
    async fn attempt(&self, query: &TrackQuery, endpoint: &MirrorEndpoint) -> MirrorOutcome {
        MirrorClient::attempt(self, query, endpoint).await
    }
}
