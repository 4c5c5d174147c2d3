//! Content negotiation helpers.

use regex::Regex;
use std::sync::OnceLock;

/// JSON media type.
pub const APPLICATION_JSON: &str = "application/json";

/// URL-encoded form media type.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Multipart form media type.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

fn json_mime_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?i)^(application/json|[^;/ \t]+/[^;/ \t]+[+]json)[ \t]*(;.*)?$")
            .expect("json mime regex must compile")
    })
}

fn xml_mime_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?i)^(application/xml|text/xml|[^;/ \t]+/[^;/ \t]+[+]xml)[ \t]*(;.*)?$")
            .expect("xml mime regex must compile")
    })
}

/// True for `application/json` and any `*/*+json` type, parameters allowed.
#[must_use]
pub fn is_json_mime(media_type: &str) -> bool {
    json_mime_regex().is_match(media_type.trim())
}

/// True for `application/xml`, `text/xml` and any `*/*+xml` type.
#[must_use]
pub fn is_xml_mime(media_type: &str) -> bool {
    xml_mime_regex().is_match(media_type.trim())
}

/// A media range with its `q` weight removed.
struct Weighted<'a> {
    media_type: String,
    weight: f32,
    original: &'a str,
}

fn parse_weighted(entry: &str) -> Weighted<'_> {
    let mut weight = 1.0;
    let mut kept = Vec::new();
    for (i, part) in entry.split(';').map(str::trim).enumerate() {
        if i > 0 {
            if let Some(q) = part.strip_prefix("q=").or_else(|| part.strip_prefix("Q=")) {
                weight = q.trim().parse().unwrap_or(0.0);
                continue;
            }
        }
        if !part.is_empty() {
            kept.push(part);
        }
    }
    Weighted {
        media_type: kept.join("; "),
        weight,
        original: entry,
    }
}

fn select_weighted(candidates: &[&str]) -> Option<String> {
    let parsed: Vec<Weighted<'_>> = candidates
        .iter()
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| parse_weighted(entry))
        .collect();

    let best = parsed
        .iter()
        .map(|w| w.weight)
        .fold(f32::NEG_INFINITY, f32::max);

    let top = || parsed.iter().filter(move |w| (w.weight - best).abs() < f32::EPSILON);
    top()
        .find(|w| is_json_mime(&w.media_type))
        .or_else(|| top().next())
        .map(|w| {
            tracing::trace!(selected = %w.media_type, from = %w.original, "media type negotiated");
            w.media_type.clone()
        })
}

/// Pick the request `Content-Type` from an operation's `consumes` list.
///
/// The entry with the highest `q` weight wins; among equal weights a JSON
/// type is preferred, otherwise the first listed. Returns `None` for an
/// empty list.
#[must_use]
pub fn select_header_content_type(consumes: &[&str]) -> Option<String> {
    select_weighted(consumes)
}

/// Pick the `Accept` header from an operation's `produces` list by the same
/// rule as [`select_header_content_type`].
#[must_use]
pub fn select_header_accept(produces: &[&str]) -> Option<String> {
    select_weighted(produces)
}
