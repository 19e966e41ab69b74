// Database models - Annotation
use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationRecord;

/// A persisted entity tag for one transcript token.
///
/// `start_index`/`end_index` are token positions, not character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub document_id: String,
    pub token: String,
    pub ner_class: Option<String>,
    pub start_index: i64,
    pub end_index: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Annotation {
    pub fn new(
        document_id: String,
        token: String,
        ner_class: Option<String>,
        start_index: i64,
        end_index: i64,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id,
            token,
            ner_class,
            start_index,
            end_index,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl AnnotationRecord for Annotation {
    fn id(&self) -> &str {
        &self.id
    }

    fn start_index(&self) -> i64 {
        self.start_index
    }

    fn token(&self) -> &str {
        &self.token
    }

    fn ner_class(&self) -> Option<&str> {
        self.ner_class.as_deref()
    }
}

/// Updates that can be applied to an annotation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationUpdate {
    pub token: Option<String>,
    pub ner_class: Option<String>,
    pub start_index: Option<i64>,
    pub end_index: Option<i64>,
}
