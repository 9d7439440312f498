//! Stream manifest location and decoding.
//!
//! A track-detail response carries a base64 blob which, once decoded, is a
//! small JSON document:
//!
//! ```json
//! { "mimeType": "audio/mp4", "urls": ["https://.../stream"] }
//! ```
//!
//! Only `urls` is read. The first URL is the one we download.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::Value;

use super::domain::StreamManifest;

/// Why a manifest blob could not be turned into URLs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Manifest is not valid base64: {0}")]
    Base64(String),

    #[error("Manifest is not UTF-8 text")]
    Utf8,

    #[error("Manifest is not valid JSON: {0}")]
    Json(String),

    #[error("Manifest has no stream URLs")]
    NoUrls,
}

#[derive(Debug, Deserialize)]
struct ManifestDocument {
    #[serde(default)]
    urls: Vec<String>,
}

/// Decode a manifest blob into its ordered list of stream URLs.
pub fn decode_manifest(encoded_blob: &str) -> Result<Vec<String>, DecodeError> {
    let bytes = STANDARD
        .decode(encoded_blob.trim())
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;
    let document: ManifestDocument =
        serde_json::from_str(&text).map_err(|e| DecodeError::Json(e.to_string()))?;

    if document.urls.is_empty() {
        return Err(DecodeError::NoUrls);
    }
    Ok(document.urls)
}

/// Find the manifest blob in a track-detail response.
///
/// Checked in order: `manifest` on the body, `data.manifest`, then
/// `manifest` on the first element when the body is a list.
pub fn extract_manifest(body: &Value) -> Option<StreamManifest> {
    let candidates = [
        body.get("manifest"),
        body.get("data").and_then(|data| data.get("manifest")),
        body.as_array()
            .and_then(|list| list.first())
            .and_then(|first| first.get("manifest")),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|value| value.as_str().filter(|blob| !blob.is_empty()))
        .map(|blob| StreamManifest {
            encoded_blob: blob.to_string(),
        })
}
