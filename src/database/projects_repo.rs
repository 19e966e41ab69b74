// Projects repository for docscribe
// Handles CRUD operations for projects

use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params};

use super::documents_repo::list_documents_by_project_impl;
use super::models::{Project, ProjectUpdate, ProjectWithCount, ProjectWithDocuments};
use super::DatabaseManager;

impl DatabaseManager {
    /// Create a new project
    pub fn create_project(&self, project: &Project) -> Result<String> {
        self.with_connection(|conn| {
            create_project_impl(conn, project)
        })
    }

    /// Get a project by ID
    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        self.with_connection(|conn| {
            get_project_impl(conn, id)
        })
    }

    /// Get a project together with its documents
    pub fn get_project_with_documents(&self, id: &str) -> Result<Option<ProjectWithDocuments>> {
        self.with_connection(|conn| {
            let project = match get_project_impl(conn, id)? {
                Some(p) => p,
                None => return Ok(None),
            };
            let documents = list_documents_by_project_impl(conn, id)?;
            Ok(Some(ProjectWithDocuments { project, documents }))
        })
    }

    /// Get all projects (most recent first) with their document counts
    pub fn list_projects(&self) -> Result<Vec<ProjectWithCount>> {
        self.with_connection(|conn| {
            list_projects_impl(conn)
        })
    }

    /// Update a project, returning false when it does not exist
    pub fn update_project(&self, id: &str, updates: &ProjectUpdate) -> Result<bool> {
        self.with_connection(|conn| {
            update_project_impl(conn, id, updates)
        })
    }

    /// Delete a project and, through cascade, its documents and annotations
    pub fn delete_project(&self, id: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM projects WHERE id = ?", params![id])
                .context("Failed to delete project")?;
            Ok(deleted > 0)
        })
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn create_project_impl(conn: &Connection, project: &Project) -> Result<String> {
    conn.execute(
        r#"
        INSERT INTO projects (id, name, description, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            project.id,
            project.name,
            project.description,
            project.created_at,
            project.updated_at,
        ],
    ).context("Failed to create project")?;

    Ok(project.id.clone())
}

fn get_project_impl(conn: &Connection, id: &str) -> Result<Option<Project>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, name, description, created_at, updated_at
        FROM projects WHERE id = ?
        "#
    ).context("Failed to prepare get_project query")?;

    match stmt.query_row(params![id], project_from_row) {
        Ok(project) => Ok(Some(project)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get project"),
    }
}

fn list_projects_impl(conn: &Connection) -> Result<Vec<ProjectWithCount>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
               (SELECT COUNT(*) FROM documents d WHERE d.project_id = p.id)
        FROM projects p
        ORDER BY p.created_at DESC
        "#
    ).context("Failed to prepare list_projects query")?;

    let projects = stmt.query_map([], |row| {
        Ok(ProjectWithCount {
            project: project_from_row(row)?,
            document_count: row.get(5)?,
        })
    }).context("Failed to query projects")?;

    projects.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect projects")
}

fn update_project_impl(conn: &Connection, id: &str, updates: &ProjectUpdate) -> Result<bool> {
    let mut set_clauses = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref name) = updates.name {
        set_clauses.push("name = ?");
        params_vec.push(Box::new(name.clone()));
    }
    if let Some(ref description) = updates.description {
        set_clauses.push("description = ?");
        params_vec.push(Box::new(description.clone()));
    }

    if set_clauses.is_empty() {
        return Ok(get_project_impl(conn, id)?.is_some());
    }

    set_clauses.push("updated_at = ?");
    params_vec.push(Box::new(chrono::Utc::now().to_rfc3339()));
    params_vec.push(Box::new(id.to_string()));

    let query = format!(
        "UPDATE projects SET {} WHERE id = ?",
        set_clauses.join(", ")
    );

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

    let updated = conn.execute(&query, params_refs.as_slice())
        .context("Failed to update project")?;

    Ok(updated > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Document;
    use tempfile::{tempdir, TempDir};

    fn create_test_db() -> (TempDir, DatabaseManager) {
        let dir = tempdir().unwrap();
        let db = DatabaseManager::new(dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn test_create_and_get_project() {
        let (_dir, db) = create_test_db();

        let project = Project::new("Letters".to_string(), Some("1827 correspondence".to_string()));
        db.create_project(&project).unwrap();

        let retrieved = db.get_project(&project.id).unwrap().unwrap();
        assert_eq!(retrieved, project);
        assert!(db.get_project("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_projects_counts_documents() {
        let (_dir, db) = create_test_db();

        let project = Project::new("Letters".to_string(), None);
        db.create_project(&project).unwrap();
        for name in ["page 1", "page 2"] {
            let doc = Document::new(project.id.clone(), name.to_string(), "uploads/x.png".to_string());
            db.create_document(&doc).unwrap();
        }

        let listed = db.list_projects().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].document_count, 2);

        let with_docs = db.get_project_with_documents(&project.id).unwrap().unwrap();
        assert_eq!(with_docs.documents.len(), 2);
    }

    #[test]
    fn test_update_project() {
        let (_dir, db) = create_test_db();

        let project = Project::new("Draft".to_string(), None);
        db.create_project(&project).unwrap();

        let updates = ProjectUpdate {
            name: Some("Final".to_string()),
            description: None,
        };
        assert!(db.update_project(&project.id, &updates).unwrap());
        assert!(!db.update_project("missing", &updates).unwrap());

        let retrieved = db.get_project(&project.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Final");
        assert_eq!(retrieved.description, None);
    }

    #[test]
    fn test_delete_project_cascades() {
        let (_dir, db) = create_test_db();

        let project = Project::new("Gone".to_string(), None);
        db.create_project(&project).unwrap();
        let doc = Document::new(project.id.clone(), "scan".to_string(), "uploads/scan.png".to_string());
        db.create_document(&doc).unwrap();

        assert!(db.delete_project(&project.id).unwrap());
        assert!(db.get_document(&doc.id).unwrap().is_none());
        assert!(!db.delete_project(&project.id).unwrap());
    }
}
