// Database models - Project
use serde::{Deserialize, Serialize};

use super::Document;

/// A project groups uploaded documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Updates that can be applied to a project
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A project with the number of documents it holds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithCount {
    #[serde(flatten)]
    pub project: Project,
    pub document_count: i64,
}

/// A project with its documents (newest first)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithDocuments {
    #[serde(flatten)]
    pub project: Project,
    pub documents: Vec<Document>,
}
