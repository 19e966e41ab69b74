// Serves stored document images back to clients
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

pub async fn serve_upload(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let path = state
        .uploads()
        .resolve(&format!("uploads/{}", file))
        .ok_or_else(|| ApiError::bad_request("Invalid file name"))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("Upload"));
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to read upload {}", path.display()))
                .into());
        }
    };

    Ok(([(header::CONTENT_TYPE, content_type_for(&file))], bytes))
}
