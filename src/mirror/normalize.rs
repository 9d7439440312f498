//! Search response normalizer.
//!
//! Mirrors disagree on how they wrap search results. Known shapes, in
//! priority order:
//!
//! ```json
//! [ {...}, {...} ]                              // bare list
//! { "items": [ ... ] }                          // items
//! { "tracks": { "items": [ ... ] } }            // tracks.items
//! { "data": { "items": [ ... ] } }              // data-wrapped items
//! { "data": { "tracks": { "items": [ ... ] } } } // data-wrapped tracks.items
//! ```
//!
//! Records are returned as-is. A record wrapped under `item` is left wrapped;
//! the client unwraps it when reading the identifier.

use serde_json::Value;

/// A matcher for one known response shape.
type ShapeMatcher = fn(&Value) -> Option<&[Value]>;

/// Known shapes, tried in order. The first non-empty match wins.
const SHAPES: &[(&str, ShapeMatcher)] = &[
    ("list", bare_list),
    ("items", items_field),
    ("tracks.items", tracks_items),
    ("data", data_wrapped),
];

/// Extract the ordered result records from a search response body.
///
/// Never fails: an unknown or malformed shape yields an empty slice.
pub fn normalize(body: &Value) -> &[Value] {
    normalize_with_shape(body)
        .map(|(_, records)| records)
        .unwrap_or_default()
}

/// Like [`normalize`], also naming the shape that matched.
pub fn normalize_with_shape(body: &Value) -> Option<(&'static str, &[Value])> {
    SHAPES.iter().find_map(|(name, matcher)| {
        matcher(body)
            .filter(|records| !records.is_empty())
            .map(|records| (*name, records))
    })
}

fn bare_list(body: &Value) -> Option<&[Value]> {
    body.as_array().map(Vec::as_slice)
}

fn items_field(body: &Value) -> Option<&[Value]> {
    body.get("items")?.as_array().map(Vec::as_slice)
}

fn tracks_items(body: &Value) -> Option<&[Value]> {
    items_field(body.get("tracks")?)
}

fn data_wrapped(body: &Value) -> Option<&[Value]> {
    let data = body.get("data")?;
    let nested: [ShapeMatcher; 2] = [items_field, tracks_items];
    nested
        .iter()
        .find_map(|matcher| matcher(data).filter(|records| !records.is_empty()))
}
