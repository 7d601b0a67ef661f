//! Response construction.
//!
//! # Responsibilities
//! - Map each replay outcome to an HTTP response
//! - Emit replayed responses without adding headers of our own
//!
//! # Design Decisions
//! - Redirects are 301 so the client caches the explicit origin
//! - No default content-type: only recorded headers are sent
//! - Content-Length is derived from the decoded body by the server

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::replay::{ReplayOutcome, ReplayedResponse};

impl IntoResponse for ReplayedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl IntoResponse for ReplayOutcome {
    fn into_response(self) -> Response {
        match self {
            ReplayOutcome::Redirect { location } => match HeaderValue::from_str(&location) {
                Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
                Err(_) => {
                    tracing::warn!(location = %location, "Redirect target is not a valid header value");
                    (StatusCode::BAD_REQUEST, "Invalid origin in Referer").into_response()
                }
            },
            ReplayOutcome::BadRequest => {
                (StatusCode::BAD_REQUEST, "Missing rewritten_from marker").into_response()
            }
            ReplayOutcome::NotFound => StatusCode::NOT_FOUND.into_response(),
            ReplayOutcome::Replay(replayed) => replayed.into_response(),
            ReplayOutcome::Failed(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}
