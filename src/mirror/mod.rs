//! Mirror lookup - turns a track query into a stream locator on one mirror.
//!
//! # Architecture
//!
//! - **Domain** (`domain.rs`) - outcomes and intermediate records of an attempt
//! - **Normalizer** (`normalize.rs`) - flattens the known search response shapes
//! - **Manifest** (`manifest.rs`) - locates and decodes the stream manifest
//! - **Transport** (`transport.rs`) - the HTTP seam (reqwest in production)
//! - **Client** (`client.rs`) - the two-step search + manifest exchange
//! - **Traits** (`traits.rs`) - `MirrorApi` for injecting mirrors into the resolver
//!
//! Mirrors are volunteer-run and their JSON is not under our control, so
//! parsing works on `serde_json::Value` rather than fixed DTOs, and every
//! failure is reported as an explicit [`MirrorOutcome`] instead of an error.

pub mod client;
pub mod domain;
pub mod manifest;
pub mod normalize;
pub mod traits;
pub mod transport;

pub use client::MirrorClient;
pub use domain::{MirrorError, MirrorOutcome, SearchResult, StreamManifest};
pub use manifest::{DecodeError, decode_manifest};
pub use normalize::normalize;
pub use traits::MirrorApi;
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
