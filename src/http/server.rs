//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Serve `/loadHAR` archive loads
//! - Dispatch every other request to the replay engine
//! - Graceful shutdown on the lifecycle broadcast

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::archive::{ArchiveError, ArchiveStore};
use crate::config::ReplayConfig;
use crate::http::request::{
    make_request_span, propagate_request_id_layer, set_request_id_layer, to_replay_request,
};
use crate::lifecycle::shutdown::stopped;
use crate::observability::metrics;
use crate::replay::ReplayEngine;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: ReplayEngine,
}

/// Body of a `/loadHAR` request.
#[derive(Debug, Deserialize)]
pub struct LoadHarRequest {
    pub filename: String,
}

/// HTTP server for the replay engine.
pub struct HttpServer {
    router: Router,
    config: ReplayConfig,
}

impl HttpServer {
    /// Create a new HTTP server over a shared archive store.
    pub fn new(config: ReplayConfig, store: Arc<ArchiveStore>) -> Self {
        let state = AppState {
            engine: ReplayEngine::new(store),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ReplayConfig, state: AppState) -> Router {
        Router::new()
            .route("/loadHAR", post(load_har_handler))
            .fallback(replay_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                    .layer(propagate_request_id_layer())
                    .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
                    // Innermost: its timeout response needs a `Default` body.
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The configured router, for serving it elsewhere or driving it in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(stopped(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }
}

/// Replay handler: answers any request from the active archive.
async fn replay_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let request = to_replay_request(&method, &uri, &headers);

    tracing::debug!(method = %method, uri = %request.uri, "Received request");

    let outcome = state.engine.handle(&request);
    metrics::record_request(method.as_str(), outcome.label(), start_time);

    outcome.into_response()
}

/// Load an archive from the archive directory: `{"filename": "..."}`.
///
/// The body is decoded by hand so that clients sending `text/plain` are
/// accepted.
async fn load_har_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request: LoadHarRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid load request body");
            return (StatusCode::BAD_REQUEST, "Error parsing JSON request body").into_response();
        }
    };

    tracing::info!(filename = %request.filename, "Load requested");

    let store = state.engine.store().clone();
    let result = tokio::task::spawn_blocking(move || store.load_file(&request.filename)).await;

    match result {
        Ok(Ok(_)) => (StatusCode::OK, "OK").into_response(),
        Ok(Err(e @ ArchiveError::InvalidFileName(_))) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Ok(Err(e)) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Archive load task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
