// Export handlers: build a zip bundle and serve it for download
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::blocking;
use crate::api::error::{ApiError, ApiResult};
use crate::storage::{build_export_zip, resolve_export};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub document_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub success: bool,
    pub download_url: String,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub file: Option<String>,
}

/// Export a project, or an explicit list of documents, as a zip archive
pub async fn create_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<Json<ExportResponse>> {
    let documents = match (request.project_id, request.document_ids) {
        (Some(project_id), _) => {
            blocking(&state, move |state| Ok(state.db().list_documents_by_project(&project_id)?)).await?
        }
        (None, Some(ids)) if !ids.is_empty() => {
            blocking(&state, move |state| Ok(state.db().list_documents_by_ids(&ids)?)).await?
        }
        _ => return Err(ApiError::bad_request("Either projectId or documentIds is required")),
    };

    if documents.is_empty() {
        return Err(ApiError::NotFound("Documents"));
    }

    let count = documents.len();
    let uploads = state.uploads().clone();
    let exports_dir = state.exports_dir().to_path_buf();
    let zip_path = tokio::task::spawn_blocking(move || build_export_zip(&documents, &uploads, &exports_dir))
        .await
        .map_err(|e| anyhow::anyhow!("Export task failed: {}", e))??;

    let file_name = zip_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow::anyhow!("Export archive has no file name"))?;

    Ok(Json(ExportResponse {
        success: true,
        download_url: format!("/api/export/download?file={}", file_name),
        count,
    }))
}

pub async fn download_export(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<impl IntoResponse> {
    let file_name = query
        .file
        .ok_or_else(|| ApiError::bad_request("Missing file parameter"))?;
    let path = resolve_export(state.exports_dir(), &file_name)
        .ok_or_else(|| ApiError::bad_request("Invalid file name"))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("Export"));
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to read export {}", path.display()))
                .into());
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, TestApp};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::json;
    use std::io::Cursor;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_export_and_download() {
        let app = TestApp::new();
        let project_id = app.create_project("Letters").await;
        let (_, document) = app.upload(&project_id, Some(("scan.png", "png")), None).await;
        let id = document["id"].as_str().unwrap().to_string();
        send(
            &app,
            Method::PUT,
            &format!("/api/documents/{}/markup", id),
            Some(json!({"markup": "[Bob]{person} wrote"})),
        )
        .await;

        let (status, body) = send(&app, Method::POST, "/api/export", Some(json!({"projectId": project_id}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 1);
        let url = body["downloadUrl"].as_str().unwrap().to_string();
        assert!(url.starts_with("/api/export/download?file=export-"));

        let response = app
            .router()
            .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(archive.len(), 3);
    }

    #[tokio::test]
    async fn test_export_request_validation() {
        let app = TestApp::new();

        let (status, _) = send(&app, Method::POST, "/api/export", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::POST, "/api/export", Some(json!({"documentIds": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::POST, "/api/export", Some(json!({"documentIds": ["nope"]}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, "/api/export/download?file=../docscribe.db", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::GET, "/api/export/download?file=export-1.zip", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
