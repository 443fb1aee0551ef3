//! Scene handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use vgen_models::{NewScene, ReorderRequest, SceneStatusView, SceneUpdate, Sequence};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::sequence_id;
use crate::state::AppState;

#[derive(Serialize)]
pub struct AddSceneResponse {
    pub scene_number: u32,
    pub sequence: Sequence,
}

#[derive(Serialize)]
pub struct ReorderResponse {
    pub sequence: Sequence,
    pub order: Vec<u32>,
    /// Scenes whose continuity source now comes after them; generating
    /// them fails until the source or order is fixed.
    pub stale_continuity: Vec<u32>,
}

/// POST /api/sequences/:sequence_id/scenes
pub async fn add_scene(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sequence_id_raw): Path<String>,
    Json(scene): Json<NewScene>,
) -> ApiResult<(StatusCode, Json<AddSceneResponse>)> {
    let id = sequence_id(sequence_id_raw)?;
    let (sequence, scene_number) = state.sequencer.add_scene(&user.uid, &id, scene).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddSceneResponse {
            scene_number,
            sequence,
        }),
    ))
}

/// PATCH /api/sequences/:sequence_id/scenes/:scene_number
pub async fn update_scene(
    State(state): State<AppState>,
    user: AuthUser,
    Path((sequence_id_raw, scene_number)): Path<(String, u32)>,
    Json(update): Json<SceneUpdate>,
) -> ApiResult<Json<Sequence>> {
    let id = sequence_id(sequence_id_raw)?;
    let sequence = state
        .sequencer
        .update_scene(&user.uid, &id, scene_number, update)
        .await?;
    Ok(Json(sequence))
}

/// DELETE /api/sequences/:sequence_id/scenes/:scene_number
pub async fn remove_scene(
    State(state): State<AppState>,
    user: AuthUser,
    Path((sequence_id_raw, scene_number)): Path<(String, u32)>,
) -> ApiResult<Json<Sequence>> {
    let id = sequence_id(sequence_id_raw)?;
    let sequence = state
        .sequencer
        .remove_scene(&user.uid, &id, scene_number)
        .await?;
    Ok(Json(sequence))
}

/// POST /api/sequences/:sequence_id/reorder
pub async fn reorder_scenes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sequence_id_raw): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<ReorderResponse>> {
    let id = sequence_id(sequence_id_raw)?;
    let (sequence, outcome) = state
        .sequencer
        .reorder_scenes(&user.uid, &id, request)
        .await?;
    Ok(Json(ReorderResponse {
        sequence,
        order: outcome.order,
        stale_continuity: outcome.stale_continuity,
    }))
}

/// POST /api/sequences/:sequence_id/scenes/:scene_number/generate
pub async fn generate_scene(
    State(state): State<AppState>,
    user: AuthUser,
    Path((sequence_id_raw, scene_number)): Path<(String, u32)>,
) -> ApiResult<(StatusCode, Json<Sequence>)> {
    let id = sequence_id(sequence_id_raw)?;
    let sequence = state
        .sequencer
        .generate_scene(&user.uid, &id, scene_number)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(sequence)))
}

/// GET /api/sequences/:sequence_id/scenes/:scene_number/status
pub async fn scene_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path((sequence_id_raw, scene_number)): Path<(String, u32)>,
) -> ApiResult<Json<SceneStatusView>> {
    let id = sequence_id(sequence_id_raw)?;
    Ok(Json(
        state
            .sequencer
            .scene_status(&user.uid, &id, scene_number)
            .await?,
    ))
}
