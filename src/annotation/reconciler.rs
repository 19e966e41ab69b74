// Annotation core - Positional annotation reconciliation
//
// Records are matched to tokens by `start_index` only. Inserting or removing
// tokens shifts positions, and records follow the index rather than the text.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::token::EntityToken;

/// A persisted annotation as seen by the reconciler
pub trait AnnotationRecord {
    fn id(&self) -> &str;
    /// Token position the record is attached to
    fn start_index(&self) -> i64;
    fn token(&self) -> &str;
    fn ner_class(&self) -> Option<&str>;
}

/// One store operation needed to bring annotation records in line with a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AnnotationOp {
    Create {
        token: String,
        ner_class: String,
        start_index: i64,
        end_index: i64,
    },
    Update {
        id: String,
        token: String,
        ner_class: String,
    },
    Delete {
        id: String,
    },
}

/// Operation counts for logging and API responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl ReconcileSummary {
    pub fn from_ops(ops: &[AnnotationOp]) -> Self {
        let mut summary = Self::default();
        for op in ops {
            match op {
                AnnotationOp::Create { .. } => summary.created += 1,
                AnnotationOp::Update { .. } => summary.updated += 1,
                AnnotationOp::Delete { .. } => summary.deleted += 1,
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// Compute the operations that make `existing` match the tagged tokens of `transcript`.
///
/// Creates and updates come first in token order, deletes follow in record order.
/// When several records share a position, the first one is kept.
pub fn reconcile<R: AnnotationRecord>(existing: &[R], transcript: &[EntityToken]) -> Vec<AnnotationOp> {
    let mut ops = Vec::new();
    let mut live: HashSet<&str> = HashSet::new();

    for (position, token) in transcript.iter().enumerate() {
        let Some(class) = token.class() else { continue };
        let start_index = position as i64;

        match existing.iter().find(|record| record.start_index() == start_index) {
            Some(record) => {
                live.insert(record.id());
                if record.token() != token.text || record.ner_class() != Some(class) {
                    ops.push(AnnotationOp::Update {
                        id: record.id().to_string(),
                        token: token.text.clone(),
                        ner_class: class.to_string(),
                    });
                }
            }
            None => ops.push(AnnotationOp::Create {
                token: token.text.clone(),
                ner_class: class.to_string(),
                start_index,
                end_index: start_index + 1,
            }),
        }
    }

    for record in existing {
        if !live.contains(record.id()) {
            ops.push(AnnotationOp::Delete {
                id: record.id().to_string(),
            });
        }
    }

    ops
}
