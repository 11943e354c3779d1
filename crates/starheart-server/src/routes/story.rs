//! Story progress routes.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use starheart_types::{InitRequest, ProgressPatch, SessionProgress, VerifyRequest, VerifyResponse};
use std::sync::Arc;
use tracing::{debug, info};

/// POST /api/story/init - Get or create a session's progress.
pub async fn init(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InitRequest>, JsonRejection>,
) -> Result<Json<SessionProgress>, ApiError> {
    let Json(req) = payload?;
    let progress = state.service.init(&req.session_id)?;
    Ok(Json(progress))
}

/// GET /api/story/{session_id} - Current progress of a session.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionProgress>, ApiError> {
    let progress = state.service.get(&session_id).inspect_err(|_| {
        debug!(target: "starheart::api", "No progress for session {}", session_id);
    })?;
    Ok(Json(progress))
}

/// PATCH /api/story/{session_id} - Apply a partial update.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    payload: Result<Json<ProgressPatch>, JsonRejection>,
) -> Result<Json<SessionProgress>, ApiError> {
    let Json(patch) = payload?;
    let progress = state.service.update(&session_id, &patch)?;

    if patch.is_complete == Some(true) {
        info!(target: "starheart::api", "Session {} reached the ending", session_id);
    }
    Ok(Json(progress))
}

/// POST /api/story/verify - Check the finale password.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(req) = payload?;
    let result = state.service.verify_password(&req.password)?;
    Ok(Json(result))
}
