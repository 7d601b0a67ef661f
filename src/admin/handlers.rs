use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::archive::{ArchiveError, ArchiveSummary};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub archive_loaded: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        archive_loaded: state.store.is_loaded(),
    })
}

pub async fn get_archive(
    State(state): State<AdminState>,
) -> Result<Json<ArchiveSummary>, (StatusCode, &'static str)> {
    state
        .store
        .current()
        .map(|snapshot| Json(snapshot.summary()))
        .ok_or((StatusCode::NOT_FOUND, "No archive loaded"))
}

pub async fn reload_archive(
    State(state): State<AdminState>,
) -> Result<Json<ArchiveSummary>, (StatusCode, String)> {
    let store = state.store.clone();
    let result = tokio::task::spawn_blocking(move || store.reload())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match result {
        Ok(snapshot) => Ok(Json(snapshot.summary())),
        Err(e @ (ArchiveError::NotLoaded | ArchiveError::Superseded)) => {
            Err((StatusCode::CONFLICT, e.to_string()))
        }
        Err(e) => Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string())),
    }
}
