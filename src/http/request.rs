//! Request handling.
//!
//! # Responsibilities
//! - Generate a request ID (`x-request-id`, UUID v4) as early as possible
//! - Extract what the replay engine needs: method, path+query, Referer,
//!   Cookie
//!
//! # Design Decisions
//! - The raw path and query are passed through untouched; the marker is
//!   located textually, never by re-encoding the query

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Method, Request, Uri};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Span;

use crate::replay::{CookieSet, ReplayRequest};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer assigning a fresh UUID to requests that arrive without one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer copying the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Span for one request, tagged with its ID.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    )
}

/// Build the engine's view of an incoming request.
pub fn to_replay_request(method: &Method, uri: &Uri, headers: &HeaderMap) -> ReplayRequest {
    let referer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cookies = CookieSet::from_header_values(
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    );

    ReplayRequest {
        method: method.as_str().to_string(),
        uri: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string()),
        referer,
        cookies,
    }
}
