// WHY: splits input text into literal runs and recognized matches without losing a byte
// Literals plus each match's matched_text, in order, always rebuild the input exactly

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::config::Configuration;
use crate::recognizer::{EnabledKinds, Match, Recognizer};

pub mod token;

pub use token::{segment_rewritten, Fragment, TokenGenerator};

/// One piece of segmented text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    /// Text that is not part of any match, returned verbatim
    Text { text: String },
    /// A recognized entity
    Link {
        #[serde(flatten)]
        found: Match,
    },
}

impl Part {
    /// The input text this part covers
    pub fn source_text(&self) -> &str {
        match self {
            Part::Text { text } => text,
            Part::Link { found } => &found.matched_text,
        }
    }

    pub fn as_match(&self) -> Option<&Match> {
        match self {
            Part::Text { .. } => None,
            Part::Link { found } => Some(found),
        }
    }
}

/// Concatenate the source text of every part
pub fn reconstruct(parts: &[Part]) -> String {
    parts.iter().map(Part::source_text).collect()
}

/// Append literal text, merging with a preceding literal; empty text is dropped
pub(crate) fn push_text(parts: &mut Vec<Part>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Part::Text { text: previous }) = parts.last_mut() {
        previous.push_str(text);
        return;
    }
    parts.push(Part::Text {
        text: text.to_string(),
    });
}

/// Append a match, demoting it to literal text when its kind is disabled
pub(crate) fn push_match(parts: &mut Vec<Part>, found: Match, kinds: &EnabledKinds) {
    if kinds.allows(found.kind) {
        parts.push(Part::Link { found });
    } else {
        push_text(parts, &found.matched_text);
    }
}

/// Segment `text` using a recognizer that reports explicit spans
///
/// Fails when the recognizer fails or reports spans that are out of order,
/// overlapping, outside the text, or whose `matched_text` differs from the
/// text they cover.
pub fn segment<R: Recognizer + ?Sized>(
    text: &str,
    config: &Configuration,
    recognizer: &R,
) -> Result<Vec<Part>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let options = config.recognize_options();
    let matches = recognizer.recognize(text, &options)?;
    let mut parts = Vec::with_capacity(matches.len() * 2 + 1);
    let mut cursor = 0;

    for found in matches {
        let range = found.range.clone();
        let Some(literal) = text.get(cursor..range.start) else {
            anyhow::bail!(
                "Span {}..{} starts before the previous match ended at {}",
                range.start,
                range.end,
                cursor
            );
        };
        match text.get(range.clone()) {
            Some(covered) if covered == found.matched_text => {}
            _ => anyhow::bail!(
                "Span {}..{} does not cover the matched text {:?}",
                range.start,
                range.end,
                found.matched_text
            ),
        }
        push_text(&mut parts, literal);
        push_match(&mut parts, found, &options.kinds);
        cursor = range.end;
    }
    push_text(&mut parts, &text[cursor..]);

    debug!("Segmented {} bytes into {} parts", text.len(), parts.len());
    Ok(parts)
}
