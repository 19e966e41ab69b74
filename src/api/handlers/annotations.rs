// Annotation record handlers
use axum::extract::{Path, State};
use axum::Json;

use super::SuccessResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::database::{Annotation, AnnotationUpdate};
use crate::state::AppState;

pub async fn get_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Annotation>> {
    state
        .db()
        .get_annotation(&id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Annotation"))
}

pub async fn update_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(updates): Json<AnnotationUpdate>,
) -> ApiResult<Json<Annotation>> {
    if let (Some(start), Some(end)) = (updates.start_index, updates.end_index) {
        if end < start {
            return Err(ApiError::bad_request("endIndex must not be before startIndex"));
        }
    }
    if !state.db().update_annotation(&id, &updates)? {
        return Err(ApiError::NotFound("Annotation"));
    }
    state
        .db()
        .get_annotation(&id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Annotation"))
}

pub async fn delete_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    if !state.db().delete_annotation(&id)? {
        return Err(ApiError::NotFound("Annotation"));
    }
    Ok(SuccessResponse::ok())
}
