// WHY: entity recognition sits behind traits so the segmenter never depends on a concrete engine
// Two engine shapes exist: span-returning and output-text-only (callback rewriting)

use anyhow::Result;
use serde::Serialize;
use std::ops::Range;

pub mod builtin;

pub use builtin::BuiltinRecognizer;

/// Category of a recognized span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Email,
    Url,
    Phone,
    Hashtag,
    Mention,
    /// Anything an external engine reports that has no dedicated link action
    Other,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Email => "email",
            EntityKind::Url => "url",
            EntityKind::Phone => "phone",
            EntityKind::Hashtag => "hashtag",
            EntityKind::Mention => "mention",
            EntityKind::Other => "other",
        }
    }

    /// Kinds that render as interactive links
    pub fn is_linkable(&self) -> bool {
        !matches!(self, EntityKind::Other)
    }
}

/// A recognized span of the input text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub kind: EntityKind,
    /// Verbatim substring of the input
    pub matched_text: String,
    /// Address, digits, href, tag name or handle depending on `kind`
    pub canonical_value: String,
    /// Label text, prefix-stripped when configured (never truncated here)
    pub display_text: String,
    /// Byte offsets of `matched_text` in the input
    pub range: Range<usize>,
}

impl Match {
    /// Build a match whose label is the matched text itself
    pub fn new(
        kind: EntityKind,
        matched_text: impl Into<String>,
        canonical_value: impl Into<String>,
        range: Range<usize>,
    ) -> Self {
        let matched_text = matched_text.into();
        Self {
            kind,
            display_text: matched_text.clone(),
            matched_text,
            canonical_value: canonical_value.into(),
            range,
        }
    }

    pub fn with_display_text(mut self, display_text: impl Into<String>) -> Self {
        self.display_text = display_text.into();
        self
    }
}

/// Entity kinds a recognizer is allowed to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledKinds {
    pub email: bool,
    pub url: bool,
    pub phone: bool,
    pub hashtag: bool,
    pub mention: bool,
}

impl EnabledKinds {
    pub fn all() -> Self {
        Self {
            email: true,
            url: true,
            phone: true,
            hashtag: true,
            mention: true,
        }
    }

    pub fn none() -> Self {
        Self {
            email: false,
            url: false,
            phone: false,
            hashtag: false,
            mention: false,
        }
    }

    pub fn allows(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Email => self.email,
            EntityKind::Url => self.url,
            EntityKind::Phone => self.phone,
            EntityKind::Hashtag => self.hashtag,
            EntityKind::Mention => self.mention,
            EntityKind::Other => true,
        }
    }
}

/// Options handed to the recognition engine for one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognizeOptions {
    pub kinds: EnabledKinds,
    /// Drop URL scheme and `www.` from display text
    pub strip_prefix: bool,
}

/// Engine that reports recognized spans with explicit offsets
///
/// Implementations must return matches sorted by start offset, non-overlapping,
/// with `range` on UTF-8 character boundaries of `text`.
pub trait Recognizer {
    fn recognize(&self, text: &str, options: &RecognizeOptions) -> Result<Vec<Match>>;
}

/// Engine that only returns rewritten text
///
/// `replace` is called once per discovered match, in text order, and its return
/// value replaces the matched span in the output.
pub trait RewriteEngine {
    fn rewrite(
        &self,
        text: &str,
        options: &RecognizeOptions,
        replace: &mut dyn FnMut(Match) -> String,
    ) -> Result<String>;
}

impl<R: Recognizer + ?Sized> RewriteEngine for R {
    fn rewrite(
        &self,
        text: &str,
        options: &RecognizeOptions,
        replace: &mut dyn FnMut(Match) -> String,
    ) -> Result<String> {
        let matches = self.recognize(text, options)?;
        let mut rewritten = String::with_capacity(text.len());
        let mut cursor = 0;

        for found in matches {
            let range = found.range.clone();
            match text.get(cursor..range.start) {
                Some(literal) if range.start <= range.end => rewritten.push_str(literal),
                _ => anyhow::bail!(
                    "Recognizer returned out-of-order span {}..{} after offset {}",
                    range.start,
                    range.end,
                    cursor
                ),
            }
            rewritten.push_str(&replace(found));
            cursor = range.end;
        }

        match text.get(cursor..) {
            Some(tail) => rewritten.push_str(tail),
            None => anyhow::bail!("Recognizer returned span ending outside the text at {cursor}"),
        }
        Ok(rewritten)
    }
}
