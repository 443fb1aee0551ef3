//! Single-clip generation handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use vgen_models::{GenerateVideoRequest, GenerationStatus, VideoGeneration};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::video_id;
use crate::state::AppState;

const MAX_LIST_LIMIT: usize = 100;

/// POST /api/videos/generate
///
/// Validates and stores the request, then generates in the background. The
/// returned document is already marked `generating`; poll
/// `GET /api/videos/:video_id` for the outcome.
pub async fn generate_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<GenerateVideoRequest>,
) -> ApiResult<(StatusCode, Json<VideoGeneration>)> {
    let video = state.sequencer.generate_video(&user.uid, request).await?;
    info!(video_id = %video.id, user_id = %user.uid, "Accepted video generation");
    Ok((StatusCode::ACCEPTED, Json(video)))
}

#[derive(Debug, Deserialize)]
pub struct ListVideosQuery {
    #[serde(default)]
    pub status: Option<GenerationStatus>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ListVideosResponse {
    pub videos: Vec<VideoGeneration>,
    pub total: usize,
}

/// GET /api/videos
pub async fn list_videos(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListVideosQuery>,
) -> ApiResult<Json<ListVideosResponse>> {
    let limit = query.limit.map(|l| l.clamp(1, MAX_LIST_LIMIT));
    let videos = state
        .sequencer
        .list_videos(&user.uid, query.status, limit)
        .await?;
    let total = videos.len();
    Ok(Json(ListVideosResponse { videos, total }))
}

/// GET /api/videos/:video_id
pub async fn get_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id_raw): Path<String>,
) -> ApiResult<Json<VideoGeneration>> {
    let id = video_id(video_id_raw)?;
    Ok(Json(state.sequencer.get_video(&user.uid, &id).await?))
}

/// DELETE /api/videos/:video_id
pub async fn delete_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id_raw): Path<String>,
) -> ApiResult<StatusCode> {
    let id = video_id(video_id_raw)?;
    state.sequencer.delete_video(&user.uid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
