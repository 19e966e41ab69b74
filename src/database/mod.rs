// Database module for docscribe
// Provides SQLite persistence for projects, documents and annotation records

pub mod manager;
pub mod migrations;
pub mod models;
pub mod projects_repo;
pub mod documents_repo;
pub mod annotations_repo;

pub use annotations_repo::ReconcileOutcome;
pub use manager::DatabaseManager;
pub use models::*;
