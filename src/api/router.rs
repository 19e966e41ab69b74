// Router - maps HTTP routes onto handlers
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use super::handlers::{annotations, documents, export, healthz_handler, projects, uploads};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config().max_upload_bytes;

    Router::new()
        .route("/healthz", get(healthz_handler))
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/projects/:id/documents",
            get(projects::list_project_documents).post(documents::upload_document),
        )
        .route(
            "/api/documents/:id",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route("/api/documents/:id/transcribe", post(documents::transcribe_document))
        .route(
            "/api/documents/:id/markup",
            get(documents::get_markup).put(documents::put_markup),
        )
        .route("/api/documents/:id/spans", get(documents::get_spans))
        .route(
            "/api/annotations/:id",
            get(annotations::get_annotation)
                .put(annotations::update_annotation)
                .delete(annotations::delete_annotation),
        )
        .route("/api/export", post(export::create_export))
        .route("/api/export/download", get(export::download_export))
        .route("/uploads/:file", get(uploads::serve_upload))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
