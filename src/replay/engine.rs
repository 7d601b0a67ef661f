//! Per-request control flow over the active archive.

use std::sync::Arc;

use crate::archive::store::{ArchiveSnapshot, ArchiveStore};
use crate::replay::cookies::CookieSet;
use crate::replay::matcher::match_request;
use crate::replay::origin::{resolve, Resolution};
use crate::replay::replayer::{replay, ReplayError, ReplayedResponse};

/// The parts of an incoming request the engine looks at.
#[derive(Debug, Clone, Default)]
pub struct ReplayRequest {
    pub method: String,
    /// Path and query exactly as received.
    pub uri: String,
    pub referer: Option<String>,
    pub cookies: CookieSet,
}

/// What to send back for a request.
#[derive(Debug)]
pub enum ReplayOutcome {
    /// Permanent redirect to `location`; nothing is replayed.
    Redirect { location: String },
    /// Origin marker missing.
    BadRequest,
    /// No archive loaded, no recorded entry, or method not replayed.
    NotFound,
    Replay(ReplayedResponse),
    /// Matched entry could not be rebuilt.
    Failed(ReplayError),
}

impl ReplayOutcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Redirect { .. } => "redirect",
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::Replay(_) => "replayed",
            Self::Failed(_) => "failed",
        }
    }
}

/// Answer a request from a snapshot.
pub fn replay_request(snapshot: &ArchiveSnapshot, request: &ReplayRequest) -> ReplayOutcome {
    let resolution = resolve(
        &request.uri,
        request.referer.as_deref(),
        &snapshot.fallback_origin,
    );

    let (origin, stripped_uri, source) = match resolution {
        Resolution::Resolved {
            origin,
            stripped_uri,
            source,
        } => (origin, stripped_uri, source),
        Resolution::Redirect { location } => {
            tracing::debug!(uri = %request.uri, location = %location, "Redirecting to explicit origin");
            return ReplayOutcome::Redirect { location };
        }
        Resolution::Malformed => {
            tracing::warn!(uri = %request.uri, "Request carries no origin marker");
            return ReplayOutcome::BadRequest;
        }
    };

    let full_url = format!("{origin}{stripped_uri}");
    tracing::debug!(url = %full_url, origin_source = ?source, "Seeking recorded entry");

    let Some(entry) = match_request(&snapshot.index, &full_url, &request.method, &request.cookies)
    else {
        tracing::debug!(method = %request.method, url = %full_url, "No match found");
        return ReplayOutcome::NotFound;
    };

    match replay(entry) {
        Ok(response) => {
            tracing::info!(
                method = %request.method,
                url = %full_url,
                matched = %entry.request.url,
                status = response.status.as_u16(),
                "Replaying recorded response"
            );
            ReplayOutcome::Replay(response)
        }
        Err(e) => {
            tracing::error!(url = %full_url, error = %e, "Recorded entry cannot be replayed");
            ReplayOutcome::Failed(e)
        }
    }
}

/// Replay engine bound to an archive store.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    store: Arc<ArchiveStore>,
}

impl ReplayEngine {
    pub fn new(store: Arc<ArchiveStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ArchiveStore> {
        &self.store
    }

    /// Answer a request from whatever snapshot is active right now.
    pub fn handle(&self, request: &ReplayRequest) -> ReplayOutcome {
        match self.store.current() {
            Some(snapshot) => replay_request(&snapshot, request),
            None => {
                tracing::warn!(uri = %request.uri, "No archive loaded");
                ReplayOutcome::NotFound
            }
        }
    }
}
