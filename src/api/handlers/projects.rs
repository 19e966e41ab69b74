// Project handlers
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{blocking, SuccessResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::database::{DocumentWithAnnotations, Project, ProjectUpdate, ProjectWithCount, ProjectWithDocuments};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn required_name(name: Option<&str>) -> ApiResult<String> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ApiError::bad_request("Project name is required")),
    }
}

pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<ProjectWithCount>>> {
    Ok(Json(state.db().list_projects()?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let name = required_name(request.name.as_deref())?;
    let project = Project::new(name, request.description);
    state.db().create_project(&project)?;
    log::info!("Created project {} ({})", project.name, project.id);
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectWithDocuments>> {
    state
        .db()
        .get_project_with_documents(&id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Project"))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut updates): Json<ProjectUpdate>,
) -> ApiResult<Json<Project>> {
    if updates.name.is_some() {
        updates.name = Some(required_name(updates.name.as_deref())?);
    }
    if !state.db().update_project(&id, &updates)? {
        return Err(ApiError::NotFound("Project"));
    }
    state
        .db()
        .get_project(&id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Project"))
}

/// Delete a project, its documents and their stored images
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let project_id = id.clone();
    let documents = blocking(&state, move |state| Ok(state.db().list_documents_by_project(&project_id)?)).await?;
    if !state.db().delete_project(&id)? {
        return Err(ApiError::NotFound("Project"));
    }
    for document in &documents {
        state.uploads().delete(&document.image_path);
    }
    log::info!("Deleted project {} with {} documents", id, documents.len());
    Ok(SuccessResponse::ok())
}

pub async fn list_project_documents(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<DocumentWithAnnotations>>> {
    if state.db().get_project(&id)?.is_none() {
        return Err(ApiError::NotFound("Project"));
    }
    let documents = blocking(&state, move |state| Ok(state.db().list_documents_with_annotations(&id)?)).await?;
    Ok(Json(documents))
}
