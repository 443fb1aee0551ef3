//! Sequence handlers: CRUD, whole-sequence generation, export and status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use vgen_models::{NewSequence, Sequence, SequenceStatusView, SequenceUpdate};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::sequence_id;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ListSequencesResponse {
    pub sequences: Vec<Sequence>,
}

/// POST /api/sequences
pub async fn create_sequence(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<NewSequence>,
) -> ApiResult<(StatusCode, Json<Sequence>)> {
    let sequence = state.sequencer.create_sequence(&user.uid, request).await?;
    Ok((StatusCode::CREATED, Json(sequence)))
}

/// GET /api/sequences
pub async fn list_sequences(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ListSequencesResponse>> {
    let sequences = state.sequencer.list_sequences(&user.uid).await?;
    Ok(Json(ListSequencesResponse { sequences }))
}

/// GET /api/sequences/:sequence_id
pub async fn get_sequence(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sequence_id_raw): Path<String>,
) -> ApiResult<Json<Sequence>> {
    let id = sequence_id(sequence_id_raw)?;
    Ok(Json(state.sequencer.get_sequence(&user.uid, &id).await?))
}

/// PATCH /api/sequences/:sequence_id
pub async fn update_sequence(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sequence_id_raw): Path<String>,
    Json(update): Json<SequenceUpdate>,
) -> ApiResult<Json<Sequence>> {
    let id = sequence_id(sequence_id_raw)?;
    Ok(Json(state.sequencer.update_sequence(&user.uid, &id, update).await?))
}

/// DELETE /api/sequences/:sequence_id
pub async fn delete_sequence(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sequence_id_raw): Path<String>,
) -> ApiResult<StatusCode> {
    let id = sequence_id(sequence_id_raw)?;
    state.sequencer.delete_sequence(&user.uid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sequences/:sequence_id/generate
///
/// Generates every pending or failed scene in order, in the background.
pub async fn generate_sequence(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sequence_id_raw): Path<String>,
) -> ApiResult<(StatusCode, Json<Sequence>)> {
    let id = sequence_id(sequence_id_raw)?;
    let sequence = state.sequencer.generate_sequence(&user.uid, &id).await?;
    info!(sequence_id = %id, user_id = %user.uid, "Accepted sequence generation");
    Ok((StatusCode::ACCEPTED, Json(sequence)))
}

/// POST /api/sequences/:sequence_id/export
///
/// Runs to completion before responding; exports are bounded by the
/// configured FFmpeg timeout.
pub async fn export_sequence(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sequence_id_raw): Path<String>,
) -> ApiResult<Json<Sequence>> {
    let id = sequence_id(sequence_id_raw)?;
    Ok(Json(state.sequencer.export_sequence(&user.uid, &id).await?))
}

/// GET /api/sequences/:sequence_id/status
pub async fn sequence_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sequence_id_raw): Path<String>,
) -> ApiResult<Json<SequenceStatusView>> {
    let id = sequence_id(sequence_id_raw)?;
    Ok(Json(state.sequencer.sequence_status(&user.uid, &id).await?))
}
