//! Client-side route builders.

use crate::EntityKind;

/// `/companies/<slug>`, `/investors/<slug>` or `/people/<slug>`.
///
/// A missing slug still produces the route with an empty final segment.
pub fn detail_route(kind: EntityKind, slug: Option<&str>) -> String {
    format!("/{}/{}", kind.path_segment(), slug.unwrap_or_default())
}

/// Full-text search page carrying the raw query, percent-encoded.
pub fn search_route(query: &str) -> String {
    format!("/search?q={}", urlencoding::encode(query))
}
