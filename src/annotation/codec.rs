// Annotation core - Bracket-brace markup codec
//
// `[Paris]{location}` marks a tagged token, everything else is plain text.
// Markup characters inside token text are not escaped.

use once_cell::sync::Lazy;
use regex::Regex;

use super::token::{EntityToken, Transcript};

static ENTITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]\{([^}]+)\}").expect("entity markup pattern is valid")
});

/// Encode a transcript as inline markup
pub fn encode(transcript: &[EntityToken]) -> String {
    let mut markup = String::new();
    for token in transcript {
        match token.class() {
            Some(class) => {
                markup.push('[');
                markup.push_str(&token.text);
                markup.push_str("]{");
                markup.push_str(class);
                markup.push('}');
            }
            None => markup.push_str(&token.text),
        }
    }
    markup
}

/// Decode inline markup into a transcript.
///
/// Never fails: text that does not form a complete `[token]{class}` entity is
/// kept as plain text. Plain text is split into runs of non-newline characters
/// and one token per line break.
pub fn decode(markup: &str) -> Transcript {
    let mut transcript = Vec::new();
    let mut cursor = 0;

    for caps in ENTITY_PATTERN.captures_iter(markup) {
        let Some(whole) = caps.get(0) else { continue };
        push_plain(&mut transcript, &markup[cursor..whole.start()]);
        transcript.push(EntityToken::tagged(&caps[1], &caps[2]));
        cursor = whole.end();
    }
    push_plain(&mut transcript, &markup[cursor..]);

    transcript
}

fn push_plain(transcript: &mut Transcript, text: &str) {
    let mut run_start = 0;
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            if run_start < idx {
                transcript.push(EntityToken::plain(&text[run_start..idx]));
            }
            transcript.push(EntityToken::plain("\n"));
            run_start = idx + 1;
        }
    }
    if run_start < text.len() {
        transcript.push(EntityToken::plain(&text[run_start..]));
    }
}
