// Database models - Document
use serde::{Deserialize, Serialize};

use super::Annotation;
use crate::annotation::Transcript;

/// An uploaded document image and its current transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub project_id: String,
    pub name: String,
    /// Path relative to the data directory, e.g. `uploads/<uuid>-scan.png`
    pub image_path: String,
    /// None until the document has been transcribed
    pub transcript: Option<Transcript>,
    pub created_at: String,
    pub updated_at: String,
}

impl Document {
    pub fn new(project_id: String, name: String, image_path: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id,
            name,
            image_path,
            transcript: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// The transcript, or an empty one when not yet transcribed
    pub fn transcript_or_empty(&self) -> Transcript {
        self.transcript.clone().unwrap_or_default()
    }
}

/// A document with its annotation records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentWithAnnotations {
    #[serde(flatten)]
    pub document: Document,
    pub annotations: Vec<Annotation>,
}
