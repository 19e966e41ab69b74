// Annotations repository for docscribe
// Handles CRUD operations for annotation records and transcript reconciliation

use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params};
use serde::Serialize;

use super::documents_repo::{get_document_impl, transcript_to_json};
use super::models::{Annotation, AnnotationUpdate};
use super::DatabaseManager;
use crate::annotation::{reconcile, AnnotationOp, ReconcileSummary, Transcript};

const ANNOTATION_COLUMNS: &str =
    "id, document_id, token, ner_class, start_index, end_index, created_at, updated_at";

/// Result of storing a transcript and reconciling its annotation records
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub summary: ReconcileSummary,
    pub ops: Vec<AnnotationOp>,
    pub annotations: Vec<Annotation>,
}

impl DatabaseManager {
    /// Get an annotation by ID
    pub fn get_annotation(&self, id: &str) -> Result<Option<Annotation>> {
        self.with_connection(|conn| {
            get_annotation_impl(conn, id)
        })
    }

    /// Get all annotations of a document ordered by token position
    pub fn list_annotations(&self, document_id: &str) -> Result<Vec<Annotation>> {
        self.with_connection(|conn| {
            list_annotations_impl(conn, document_id)
        })
    }

    /// Create a new annotation
    pub fn create_annotation(&self, annotation: &Annotation) -> Result<String> {
        self.with_connection(|conn| {
            create_annotation_impl(conn, annotation)
        })
    }

    /// Update an annotation, returning false when it does not exist
    pub fn update_annotation(&self, id: &str, updates: &AnnotationUpdate) -> Result<bool> {
        self.with_connection(|conn| {
            update_annotation_impl(conn, id, updates)
        })
    }

    /// Delete an annotation, returning false when it does not exist
    pub fn delete_annotation(&self, id: &str) -> Result<bool> {
        self.with_connection(|conn| {
            delete_annotation_impl(conn, id)
        })
    }

    /// Apply reconciliation operations for a document in a single transaction
    pub fn apply_annotation_ops(&self, document_id: &str, ops: &[AnnotationOp]) -> Result<Vec<Annotation>> {
        self.with_connection(|conn| {
            let tx = conn.unchecked_transaction()
                .context("Failed to start transaction")?;
            apply_ops_impl(&tx, document_id, ops)?;
            tx.commit().context("Failed to commit annotation changes")?;
            list_annotations_impl(conn, document_id)
        })
    }

    /// Replace a document's transcript and bring its annotation records in sync.
    ///
    /// Returns None when the document does not exist. The transcript write and
    /// all record changes are committed together.
    pub fn save_transcript(&self, document_id: &str, transcript: &Transcript) -> Result<Option<ReconcileOutcome>> {
        self.with_connection(|conn| {
            let tx = conn.unchecked_transaction()
                .context("Failed to start transaction")?;

            if get_document_impl(&tx, document_id)?.is_none() {
                return Ok(None);
            }

            tx.execute(
                "UPDATE documents SET transcript = ?, updated_at = ? WHERE id = ?",
                params![
                    transcript_to_json(transcript)?,
                    chrono::Utc::now().to_rfc3339(),
                    document_id,
                ],
            ).context("Failed to save transcript")?;

            let existing = list_annotations_impl(&tx, document_id)?;
            let ops = reconcile(&existing, transcript);
            apply_ops_impl(&tx, document_id, &ops)?;

            tx.commit().context("Failed to commit transcript")?;

            let summary = ReconcileSummary::from_ops(&ops);
            log::info!(
                "Saved transcript for document {} ({} tokens): {} created, {} updated, {} deleted",
                document_id,
                transcript.len(),
                summary.created,
                summary.updated,
                summary.deleted
            );

            Ok(Some(ReconcileOutcome {
                summary,
                ops,
                annotations: list_annotations_impl(conn, document_id)?,
            }))
        })
    }
}

fn annotation_from_row(row: &Row<'_>) -> rusqlite::Result<Annotation> {
    Ok(Annotation {
        id: row.get(0)?,
        document_id: row.get(1)?,
        token: row.get(2)?,
        ner_class: row.get(3)?,
        start_index: row.get(4)?,
        end_index: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn get_annotation_impl(conn: &Connection, id: &str) -> Result<Option<Annotation>> {
    let mut stmt = conn.prepare(
        &format!("SELECT {} FROM annotations WHERE id = ?", ANNOTATION_COLUMNS)
    ).context("Failed to prepare get_annotation query")?;

    match stmt.query_row(params![id], annotation_from_row) {
        Ok(annotation) => Ok(Some(annotation)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get annotation"),
    }
}

pub(super) fn list_annotations_impl(conn: &Connection, document_id: &str) -> Result<Vec<Annotation>> {
    let mut stmt = conn.prepare(
        &format!(
            "SELECT {} FROM annotations WHERE document_id = ? ORDER BY start_index ASC, created_at ASC, rowid ASC",
            ANNOTATION_COLUMNS
        )
    ).context("Failed to prepare list_annotations query")?;

    let annotations = stmt.query_map(params![document_id], annotation_from_row)
        .context("Failed to query annotations")?;

    annotations.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect annotations")
}

fn create_annotation_impl(conn: &Connection, annotation: &Annotation) -> Result<String> {
    conn.execute(
        &format!(
            "INSERT INTO annotations ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            ANNOTATION_COLUMNS
        ),
        params![
            annotation.id,
            annotation.document_id,
            annotation.token,
            annotation.ner_class,
            annotation.start_index,
            annotation.end_index,
            annotation.created_at,
            annotation.updated_at,
        ],
    ).context("Failed to create annotation")?;

    Ok(annotation.id.clone())
}

fn update_annotation_impl(conn: &Connection, id: &str, updates: &AnnotationUpdate) -> Result<bool> {
    let mut set_clauses = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref token) = updates.token {
        set_clauses.push("token = ?");
        params_vec.push(Box::new(token.clone()));
    }
    if let Some(ref ner_class) = updates.ner_class {
        set_clauses.push("ner_class = ?");
        params_vec.push(Box::new(ner_class.clone()));
    }
    if let Some(start_index) = updates.start_index {
        set_clauses.push("start_index = ?");
        params_vec.push(Box::new(start_index));
    }
    if let Some(end_index) = updates.end_index {
        set_clauses.push("end_index = ?");
        params_vec.push(Box::new(end_index));
    }

    if set_clauses.is_empty() {
        return Ok(get_annotation_impl(conn, id)?.is_some());
    }

    set_clauses.push("updated_at = ?");
    params_vec.push(Box::new(chrono::Utc::now().to_rfc3339()));
    params_vec.push(Box::new(id.to_string()));

    let query = format!(
        "UPDATE annotations SET {} WHERE id = ?",
        set_clauses.join(", ")
    );

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

    let updated = conn.execute(&query, params_refs.as_slice())
        .context("Failed to update annotation")?;

    Ok(updated > 0)
}

fn delete_annotation_impl(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM annotations WHERE id = ?", params![id])
        .context("Failed to delete annotation")?;
    Ok(deleted > 0)
}

fn apply_ops_impl(conn: &Connection, document_id: &str, ops: &[AnnotationOp]) -> Result<()> {
    for op in ops {
        match op {
            AnnotationOp::Create { token, ner_class, start_index, end_index } => {
                let annotation = Annotation::new(
                    document_id.to_string(),
                    token.clone(),
                    Some(ner_class.clone()),
                    *start_index,
                    *end_index,
                );
                create_annotation_impl(conn, &annotation)?;
            }
            AnnotationOp::Update { id, token, ner_class } => {
                let updates = AnnotationUpdate {
                    token: Some(token.clone()),
                    ner_class: Some(ner_class.clone()),
                    ..Default::default()
                };
                update_annotation_impl(conn, id, &updates)?;
            }
            AnnotationOp::Delete { id } => {
                delete_annotation_impl(conn, id)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{decode, EntityToken};
    use crate::database::models::{Document, Project};
    use tempfile::{tempdir, TempDir};

    fn create_test_db() -> (TempDir, DatabaseManager, Document) {
        let dir = tempdir().unwrap();
        let db = DatabaseManager::new(dir.path().join("test.db")).unwrap();
        let project = Project::new("Letters".to_string(), None);
        db.create_project(&project).unwrap();
        let doc = Document::new(project.id, "scan".to_string(), "uploads/scan.png".to_string());
        db.create_document(&doc).unwrap();
        (dir, db, doc)
    }

    #[test]
    fn test_annotation_crud() {
        let (_dir, db, doc) = create_test_db();

        let annotation = Annotation::new(doc.id.clone(), "Bob".to_string(), Some("person".to_string()), 0, 1);
        db.create_annotation(&annotation).unwrap();
        assert_eq!(db.get_annotation(&annotation.id).unwrap().unwrap(), annotation);

        let updates = AnnotationUpdate {
            ner_class: Some("organization".to_string()),
            ..Default::default()
        };
        assert!(db.update_annotation(&annotation.id, &updates).unwrap());
        let updated = db.get_annotation(&annotation.id).unwrap().unwrap();
        assert_eq!(updated.ner_class.as_deref(), Some("organization"));
        assert_eq!(updated.token, "Bob");

        assert!(db.delete_annotation(&annotation.id).unwrap());
        assert!(!db.delete_annotation(&annotation.id).unwrap());
        assert!(!db.update_annotation(&annotation.id, &updates).unwrap());
    }

    #[test]
    fn test_save_transcript_creates_records_for_tagged_tokens() {
        let (_dir, db, doc) = create_test_db();

        let transcript = decode("[Bob]{person} went to [NYC]{location}.");
        let outcome = db.save_transcript(&doc.id, &transcript).unwrap().unwrap();

        assert_eq!(outcome.summary, ReconcileSummary { created: 2, updated: 0, deleted: 0 });
        let positions: Vec<i64> = outcome.annotations.iter().map(|a| a.start_index).collect();
        assert_eq!(positions, vec![0, 2]);
        assert_eq!(db.get_document(&doc.id).unwrap().unwrap().transcript, Some(transcript));
    }

    #[test]
    fn test_save_transcript_preserves_record_identity() {
        let (_dir, db, doc) = create_test_db();

        let first = db.save_transcript(&doc.id, &decode("[Bob]{person} went to [NYC]{location}."))
            .unwrap()
            .unwrap();
        let bob_id = first.annotations[0].id.clone();

        let edited = decode("[Bob]{person} went to NYC.");
        let second = db.save_transcript(&doc.id, &edited).unwrap().unwrap();

        assert_eq!(second.summary, ReconcileSummary { created: 0, updated: 0, deleted: 1 });
        assert_eq!(second.annotations.len(), 1);
        assert_eq!(second.annotations[0].id, bob_id);

        let again = db.save_transcript(&doc.id, &edited).unwrap().unwrap();
        assert!(again.summary.is_empty());
    }

    #[test]
    fn test_save_transcript_unknown_document() {
        let (_dir, db, _doc) = create_test_db();
        let transcript = vec![EntityToken::plain("x")];
        assert!(db.save_transcript("missing", &transcript).unwrap().is_none());
    }

    #[test]
    fn test_apply_annotation_ops() {
        let (_dir, db, doc) = create_test_db();

        let stale = Annotation::new(doc.id.clone(), "old".to_string(), Some("date".to_string()), 3, 4);
        db.create_annotation(&stale).unwrap();

        let ops = vec![
            AnnotationOp::Create {
                token: "Yale".to_string(),
                ner_class: "organization".to_string(),
                start_index: 1,
                end_index: 2,
            },
            AnnotationOp::Delete { id: stale.id.clone() },
        ];
        let annotations = db.apply_annotation_ops(&doc.id, &ops).unwrap();

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].token, "Yale");
        assert_eq!(annotations[0].document_id, doc.id);
    }

    #[test]
    fn test_deleting_document_removes_annotations() {
        let (_dir, db, doc) = create_test_db();

        db.save_transcript(&doc.id, &decode("[Bob]{person}")).unwrap();
        assert_eq!(db.list_annotations(&doc.id).unwrap().len(), 1);

        db.delete_document(&doc.id).unwrap();
        assert!(db.list_annotations(&doc.id).unwrap().is_empty());
    }
}
