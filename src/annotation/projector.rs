// Annotation core - Span projection
//
// Flattens a transcript into plain text plus character-offset entity ranges.
// Offsets count chars, not bytes.

use serde::{Deserialize, Serialize};

use super::token::{EntityToken, Transcript};

/// A tagged character range over the flattened transcript text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRange {
    pub start: usize,
    pub end: usize,
    pub class_name: String,
}

/// Flattened transcript text with its entity ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub text: String,
    pub ranges: Vec<EntityRange>,
}

/// Per-document JSON written into export archives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub annotations: Transcript,
    pub raw_text: String,
}

impl ExportPayload {
    pub fn from_transcript(transcript: &[EntityToken]) -> Self {
        Self {
            annotations: transcript.to_vec(),
            raw_text: raw_text(transcript),
        }
    }
}

/// Project a transcript onto its flattened text
pub fn project(transcript: &[EntityToken]) -> Projection {
    let mut text = String::new();
    let mut ranges = Vec::new();
    let mut offset = 0;

    for token in transcript {
        let start = offset;
        let end = start + token.char_len();
        text.push_str(&token.text);
        if let Some(class) = token.class() {
            ranges.push(EntityRange {
                start,
                end,
                class_name: class.to_string(),
            });
        }
        offset = end;
    }

    ranges.sort_by_key(|range| range.start);

    Projection { text, ranges }
}

/// Concatenate all token texts, keeping embedded line breaks
pub fn raw_text(transcript: &[EntityToken]) -> String {
    transcript.iter().map(|token| token.text.as_str()).collect()
}

impl Projection {
    /// The substring a range covers
    pub fn slice(&self, range: &EntityRange) -> String {
        self.text
            .chars()
            .skip(range.start)
            .take(range.end - range.start)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::codec::decode;

    #[test]
    fn test_project_decoded_markup() {
        let projection = project(&decode("[Bob]{person} went to [NYC]{location}."));
        assert_eq!(projection.text, "Bob went to NYC.");
        assert_eq!(
            projection.ranges,
            vec![
                EntityRange { start: 0, end: 3, class_name: "person".to_string() },
                EntityRange { start: 12, end: 15, class_name: "location".to_string() },
            ]
        );
    }

    #[test]
    fn test_ranges_cover_exactly_the_tagged_tokens() {
        let transcript = vec![
            EntityToken::plain("Letter from "),
            EntityToken::tagged("Fanny", "person"),
            EntityToken::plain("\n"),
            EntityToken::tagged("Zürich", "location"),
            EntityToken::tagged("1827", "date"),
            EntityToken {
                text: " end".to_string(),
                entity_class: Some(String::new()),
            },
        ];
        let projection = project(&transcript);

        assert_eq!(projection.text, raw_text(&transcript));

        let covered: Vec<String> = projection.ranges.iter().map(|r| projection.slice(r)).collect();
        let tagged: Vec<String> = transcript
            .iter()
            .filter(|t| t.is_tagged())
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(covered, tagged);

        for pair in projection.ranges.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_offsets_are_char_based() {
        let projection = project(&[
            EntityToken::plain("café "),
            EntityToken::tagged("€50", "money"),
        ]);
        assert_eq!(projection.ranges[0].start, 5);
        assert_eq!(projection.ranges[0].end, 8);
        assert_eq!(projection.slice(&projection.ranges[0]), "€50");
    }

    #[test]
    fn test_empty_transcript() {
        let projection = project(&[]);
        assert!(projection.text.is_empty());
        assert!(projection.ranges.is_empty());
    }

    #[test]
    fn test_export_payload_shape() {
        let transcript = vec![EntityToken::tagged("Bob", "person"), EntityToken::plain("\nhi")];
        let payload = ExportPayload::from_transcript(&transcript);
        assert_eq!(payload.raw_text, "Bob\nhi");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["annotations"][0]["token"], "Bob");
        assert_eq!(json["raw_text"], "Bob\nhi");
    }

    #[test]
    fn test_range_serializes_camel_case() {
        let json = serde_json::to_value(EntityRange {
            start: 1,
            end: 2,
            class_name: "date".to_string(),
        })
        .unwrap();
        assert_eq!(json["className"], "date");
    }
}
