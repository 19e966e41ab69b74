// Database migrations for docscribe
// Creates and updates the database schema

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Run all necessary migrations to bring the database up to date
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    ).context("Failed to inspect schema_version table")?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    ).context("Failed to read schema version")?;

    Ok(version.unwrap_or(0))
}

/// Initial schema creation (version 1)
fn migrate_v1(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v1");

    conn.execute_batch(r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Projects table: Named groups of documents
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- Documents table: Uploaded images and their transcript (JSON token list)
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY NOT NULL,
            project_id TEXT NOT NULL,
            name TEXT NOT NULL,
            image_path TEXT NOT NULL,
            transcript TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
        );

        -- Annotations table: One entity tag per transcript token position
        CREATE TABLE IF NOT EXISTS annotations (
            id TEXT PRIMARY KEY NOT NULL,
            document_id TEXT NOT NULL,
            token TEXT NOT NULL,
            ner_class TEXT,
            start_index INTEGER NOT NULL,
            end_index INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
        );

        -- Record migration
        INSERT INTO schema_version (version) VALUES (1);
    "#).context("Failed to run migration v1")?;

    log::info!("Migration v1 completed successfully");
    Ok(())
}

/// Lookup indexes (version 2)
fn migrate_v2(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v2 - Lookup indexes");

    conn.execute_batch(r#"
        CREATE INDEX IF NOT EXISTS idx_documents_project_id
        ON documents(project_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_annotations_document_position
        ON annotations(document_id, start_index);

        INSERT INTO schema_version (version) VALUES (2);
    "#).context("Failed to run migration v2")?;

    log::info!("Migration v2 completed successfully");
    Ok(())
}
