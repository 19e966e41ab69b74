// Annotation core - Entity tokens
use serde::{Deserialize, Serialize};

/// Placeholder text stored when transcription could not produce a result
pub const PLACEHOLDER_TEXT: &str = "Error transcribing image";

/// A transcript fragment with an optional entity class.
///
/// Serialized with the field names the transcription Space uses, so stored
/// transcripts and export payloads share one JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityToken {
    #[serde(rename = "token")]
    pub text: String,
    #[serde(rename = "class_or_confidence", default)]
    pub entity_class: Option<String>,
}

impl EntityToken {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entity_class: None,
        }
    }

    pub fn tagged(text: impl Into<String>, entity_class: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entity_class: Some(entity_class.into()),
        }
    }

    /// The entity class, treating an empty class the same as none
    pub fn class(&self) -> Option<&str> {
        self.entity_class.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_tagged(&self) -> bool {
        self.class().is_some()
    }

    /// Length of the token text in chars
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Ordered token sequence; token order defines character offsets
pub type Transcript = Vec<EntityToken>;

/// Transcript used when transcription fails and the caller falls back
pub fn placeholder_transcript() -> Transcript {
    vec![EntityToken::plain(PLACEHOLDER_TEXT)]
}

/// Key used to group or colour entity classes (case-insensitive, trimmed)
pub fn normalize_class(class: &str) -> String {
    class.trim().to_lowercase()
}
