// Documents repository for docscribe
// Handles CRUD operations for documents and their stored transcripts

use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};

use super::annotations_repo::list_annotations_impl;
use super::models::{Document, DocumentWithAnnotations};
use super::DatabaseManager;
use crate::annotation::Transcript;

const DOCUMENT_COLUMNS: &str =
    "id, project_id, name, image_path, transcript, created_at, updated_at";

impl DatabaseManager {
    /// Create a new document
    pub fn create_document(&self, document: &Document) -> Result<String> {
        self.with_connection(|conn| {
            create_document_impl(conn, document)
        })
    }

    /// Get a document by ID
    pub fn get_document(&self, id: &str) -> Result<Option<Document>> {
        self.with_connection(|conn| {
            get_document_impl(conn, id)
        })
    }

    /// Get a document with its annotation records
    pub fn get_document_with_annotations(&self, id: &str) -> Result<Option<DocumentWithAnnotations>> {
        self.with_connection(|conn| {
            let document = match get_document_impl(conn, id)? {
                Some(d) => d,
                None => return Ok(None),
            };
            let annotations = list_annotations_impl(conn, id)?;
            Ok(Some(DocumentWithAnnotations { document, annotations }))
        })
    }

    /// Get all documents of a project (most recent first) with their annotations
    pub fn list_documents_with_annotations(&self, project_id: &str) -> Result<Vec<DocumentWithAnnotations>> {
        self.with_connection(|conn| {
            list_documents_by_project_impl(conn, project_id)?
                .into_iter()
                .map(|document| -> Result<DocumentWithAnnotations> {
                    let annotations = list_annotations_impl(conn, &document.id)?;
                    Ok(DocumentWithAnnotations { document, annotations })
                })
                .collect()
        })
    }

    /// Get all documents of a project (most recent first)
    pub fn list_documents_by_project(&self, project_id: &str) -> Result<Vec<Document>> {
        self.with_connection(|conn| {
            list_documents_by_project_impl(conn, project_id)
        })
    }

    /// Get the documents with the given IDs; unknown IDs are skipped
    pub fn list_documents_by_ids(&self, ids: &[String]) -> Result<Vec<Document>> {
        self.with_connection(|conn| {
            let mut documents = Vec::new();
            for id in ids {
                if let Some(document) = get_document_impl(conn, id)? {
                    documents.push(document);
                }
            }
            Ok(documents)
        })
    }

    /// Rename a document, returning false when it does not exist
    pub fn update_document_name(&self, id: &str, name: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let updated = conn.execute(
                "UPDATE documents SET name = ?, updated_at = ? WHERE id = ?",
                params![name, chrono::Utc::now().to_rfc3339(), id],
            ).context("Failed to update document name")?;
            Ok(updated > 0)
        })
    }

    /// Delete a document and, through cascade, its annotations
    pub fn delete_document(&self, id: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM documents WHERE id = ?", params![id])
                .context("Failed to delete document")?;
            Ok(deleted > 0)
        })
    }
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let transcript_json: Option<String> = row.get(4)?;
    let transcript = match transcript_json {
        Some(json) => Some(
            serde_json::from_str::<Transcript>(&json)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
        ),
        None => None,
    };

    Ok(Document {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        image_path: row.get(3)?,
        transcript,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub(super) fn transcript_to_json(transcript: &Transcript) -> Result<String> {
    serde_json::to_string(transcript).context("Failed to serialize transcript")
}

fn create_document_impl(conn: &Connection, document: &Document) -> Result<String> {
    let transcript = document.transcript.as_ref().map(transcript_to_json).transpose()?;

    conn.execute(
        &format!(
            "INSERT INTO documents ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            DOCUMENT_COLUMNS
        ),
        params![
            document.id,
            document.project_id,
            document.name,
            document.image_path,
            transcript,
            document.created_at,
            document.updated_at,
        ],
    ).context("Failed to create document")?;

    Ok(document.id.clone())
}

pub(super) fn get_document_impl(conn: &Connection, id: &str) -> Result<Option<Document>> {
    let mut stmt = conn.prepare(
        &format!("SELECT {} FROM documents WHERE id = ?", DOCUMENT_COLUMNS)
    ).context("Failed to prepare get_document query")?;

    match stmt.query_row(params![id], document_from_row) {
        Ok(document) => Ok(Some(document)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get document"),
    }
}

pub(super) fn list_documents_by_project_impl(conn: &Connection, project_id: &str) -> Result<Vec<Document>> {
    let mut stmt = conn.prepare(
        &format!(
            "SELECT {} FROM documents WHERE project_id = ? ORDER BY created_at DESC",
            DOCUMENT_COLUMNS
        )
    ).context("Failed to prepare list_documents query")?;

    let documents = stmt.query_map(params![project_id], document_from_row)
        .context("Failed to query documents")?;

    documents.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect documents")
}
