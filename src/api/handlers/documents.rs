// Document handlers: upload, edit, transcribe, markup and spans
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{blocking, SuccessResponse};
use crate::annotation::{decode, encode, project, Projection, ReconcileSummary, Transcript};
use crate::api::error::{ApiError, ApiResult};
use crate::database::{Document, DocumentWithAnnotations, ReconcileOutcome};
use crate::state::AppState;
use crate::transcription::TranscriptionRequest;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub transcript: Option<Transcript>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    #[serde(default)]
    pub ner_labels: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MarkupBody {
    pub markup: String,
}

/// A document together with what the last transcript change did to its records
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: DocumentWithAnnotations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<ReconcileSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeResponse {
    #[serde(flatten)]
    pub document: DocumentWithAnnotations,
    pub provider: &'static str,
    pub fallback_used: bool,
    pub reconciliation: ReconcileSummary,
}

fn load_document(state: &AppState, id: &str) -> ApiResult<Document> {
    state.db().get_document(id)?.ok_or(ApiError::NotFound("Document"))
}

fn load_with_annotations(state: &AppState, id: &str) -> ApiResult<DocumentWithAnnotations> {
    state
        .db()
        .get_document_with_annotations(id)?
        .ok_or(ApiError::NotFound("Document"))
}

/// Store a transcript, reconcile the records and reload the document
async fn store_transcript(
    state: &AppState,
    id: String,
    transcript: Transcript,
) -> ApiResult<(DocumentWithAnnotations, ReconcileOutcome)> {
    blocking(state, move |state| {
        let outcome = state
            .db()
            .save_transcript(&id, &transcript)?
            .ok_or(ApiError::NotFound("Document"))?;
        Ok((load_with_annotations(state, &id)?, outcome))
    })
    .await
}

/// Upload an image into a project as a new document (multipart `file`, optional `name`)
pub async fn upload_document(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Document>)> {
    if state.db().get_project(&project_id)?.is_none() {
        return Err(ApiError::NotFound("Project"));
    }

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read name: {}", e)))?;
                name = Some(text.trim().to_string()).filter(|n| !n.is_empty());
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let image_path = state.uploads().save(&file_name, &bytes)?;
    let document = Document::new(project_id, name.unwrap_or(file_name), image_path);

    if let Err(e) = state.db().create_document(&document) {
        state.uploads().delete(&document.image_path);
        return Err(e.into());
    }

    log::info!("Created document {} ({})", document.name, document.id);
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DocumentWithAnnotations>> {
    Ok(Json(load_with_annotations(&state, &id)?))
}

/// Rename a document and/or replace its transcript
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateDocumentRequest>,
) -> ApiResult<Json<DocumentResponse>> {
    load_document(&state, &id)?;

    if let Some(name) = request.name.as_deref() {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("Document name cannot be empty"));
        }
        if !state.db().update_document_name(&id, name)? {
            return Err(ApiError::NotFound("Document"));
        }
    }

    let response = match request.transcript {
        Some(transcript) => {
            let (document, outcome) = store_transcript(&state, id, transcript).await?;
            DocumentResponse {
                document,
                reconciliation: Some(outcome.summary),
            }
        }
        None => DocumentResponse {
            document: load_with_annotations(&state, &id)?,
            reconciliation: None,
        },
    };

    Ok(Json(response))
}

/// Delete a document and its stored image
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let document = load_document(&state, &id)?;
    if !state.db().delete_document(&id)? {
        return Err(ApiError::NotFound("Document"));
    }
    state.uploads().delete(&document.image_path);
    log::info!("Deleted document {}", id);
    Ok(SuccessResponse::ok())
}

/// Run transcription on the document image, then store and reconcile the result
pub async fn transcribe_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Option<Json<TranscribeRequest>>,
) -> ApiResult<Json<TranscribeResponse>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let document = load_document(&state, &id)?;

    let image_path = state
        .uploads()
        .resolve(&document.image_path)
        .filter(|p| p.exists())
        .ok_or_else(|| ApiError::bad_request("Document image is missing"))?;

    let config = state.config();
    let transcription_request = TranscriptionRequest {
        image_path,
        labels: non_empty_or(request.ner_labels, &config.default_labels),
        model: non_empty_or(request.model_name, &config.default_model),
    };

    log::info!(
        "Transcribing document {} with {} (labels: {})",
        id,
        transcription_request.model,
        transcription_request.labels
    );
    let outcome = state.transcription().transcribe(&transcription_request).await?;

    let (document, reconciled) = store_transcript(&state, id, outcome.transcript).await?;
    Ok(Json(TranscribeResponse {
        document,
        provider: outcome.provider,
        fallback_used: outcome.fallback_used,
        reconciliation: reconciled.summary,
    }))
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub async fn get_markup(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MarkupBody>> {
    let document = load_document(&state, &id)?;
    Ok(Json(MarkupBody {
        markup: encode(&document.transcript_or_empty()),
    }))
}

/// Replace the transcript with the decoded markup
pub async fn put_markup(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MarkupBody>,
) -> ApiResult<Json<DocumentResponse>> {
    let transcript = decode(&body.markup);
    let (document, outcome) = store_transcript(&state, id, transcript).await?;
    Ok(Json(DocumentResponse {
        document,
        reconciliation: Some(outcome.summary),
    }))
}

pub async fn get_spans(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Projection>> {
    let document = load_document(&state, &id)?;
    Ok(Json(project(&document.transcript_or_empty())))
}
