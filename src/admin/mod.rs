//! Admin API: archive inspection and reload behind a bearer key.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::archive::ArchiveStore;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<ArchiveStore>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(store: Arc<ArchiveStore>, api_key: &str) -> Self {
        Self {
            store,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/archive", get(get_archive))
        .route("/admin/reload", post(reload_archive))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
