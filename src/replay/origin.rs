//! Origin recovery for rewritten requests.
//!
//! The client rewrites every request to point at this server and appends
//! `rewritten_from=<origin>` to the query string, percent-encoded. When the
//! client cannot tell the origin (relative URLs resolved against this
//! server) it sends the sentinel [`UNKNOWN_ORIGIN`] instead.
//!
//! # Resolution order
//! 1. Explicit marker value, verbatim
//! 2. Sentinel + referer carrying a marker: redirect so the client retries
//!    with the origin spelled out
//! 3. Sentinel without usable referer: the archive's first page origin

use url::{form_urlencoded, Url};

/// Query parameter carrying the original origin.
pub const MARKER_KEY: &str = "rewritten_from";

/// Marker value sent when the client does not know the origin.
pub const UNKNOWN_ORIGIN: &str = "WEDUNNO";

/// Where a resolved origin came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginSource {
    Marker,
    Fallback,
}

/// Result of resolving an incoming request URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Origin known; `stripped_uri` is the path and query without the marker.
    Resolved {
        origin: String,
        stripped_uri: String,
        source: OriginSource,
    },
    /// Answer with a permanent redirect instead of replaying.
    Redirect { location: String },
    /// Marker missing from the request URI.
    Malformed,
}

struct Marker<'a> {
    stripped_uri: &'a str,
    separator: &'a str,
    value: String,
}

/// Resolve the origin of `request_uri` (path and query as received).
pub fn resolve(request_uri: &str, referer: Option<&str>, fallback_origin: &str) -> Resolution {
    let Some(marker) = find_marker(request_uri) else {
        return Resolution::Malformed;
    };

    if !is_unknown(&marker.value) {
        return Resolution::Resolved {
            origin: marker.value,
            stripped_uri: marker.stripped_uri.to_string(),
            source: OriginSource::Marker,
        };
    }

    if let Some(origin) = referer.and_then(origin_from_referer) {
        return Resolution::Redirect {
            location: format!(
                "{}{}{}={}",
                marker.stripped_uri, marker.separator, MARKER_KEY, origin
            ),
        };
    }

    Resolution::Resolved {
        origin: fallback_origin.to_string(),
        stripped_uri: marker.stripped_uri.to_string(),
        source: OriginSource::Fallback,
    }
}

/// `scheme://host` of a captured page URL; port and path are dropped.
pub fn page_origin(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let host = url.host_str()?;
    Some(format!("{}://{}", url.scheme(), host))
}

fn is_unknown(value: &str) -> bool {
    value.is_empty() || value == UNKNOWN_ORIGIN
}

/// Locate the first `rewritten_from` query parameter. Everything from its
/// separator onwards is cut from the URI.
fn find_marker(uri: &str) -> Option<Marker<'_>> {
    let query_start = uri.find('?')? + 1;
    let query_end = uri[query_start..]
        .find('#')
        .map_or(uri.len(), |i| query_start + i);

    let mut offset = query_start;
    for param in uri[query_start..query_end].split('&') {
        if param.starts_with(MARKER_KEY) && param[MARKER_KEY.len()..].starts_with('=') {
            let value = form_urlencoded::parse(param.as_bytes())
                .next()
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            return Some(Marker {
                stripped_uri: &uri[..offset - 1],
                separator: &uri[offset - 1..offset],
                value,
            });
        }
        offset += param.len() + 1;
    }
    None
}

fn origin_from_referer(referer: &str) -> Option<String> {
    let url = Url::parse(referer).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == MARKER_KEY)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !is_unknown(v))
}
