// WHY: default engine so the crate links text without an external recognizer
// URLs and e-mail come from linkify, the remaining kinds from regex-automata patterns

use anyhow::Result;
use linkify::{LinkFinder, LinkKind};
use regex_automata::meta::Regex;
use tracing::debug;

use super::{EntityKind, Match, RecognizeOptions, Recognizer};

/// North American style numbers with an optional country code
const PHONE_PATTERN: &str =
    r"(?:\+?[0-9]{1,3}[-\x20.]?)?\(?[0-9]{3}\)?[-\x20.]?[0-9]{3}[-\x20.]?[0-9]{4}";
const HASHTAG_PATTERN: &str = r"#[\p{L}\p{N}_]{1,139}";
const MENTION_PATTERN: &str = r"@[A-Za-z0-9_]{1,15}";

/// Recognizer backed by linkify and compiled regex patterns
pub struct BuiltinRecognizer {
    phone_re: Regex,
    hashtag_re: Regex,
    mention_re: Regex,
}

impl BuiltinRecognizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            phone_re: Regex::new(PHONE_PATTERN)?,
            hashtag_re: Regex::new(HASHTAG_PATTERN)?,
            mention_re: Regex::new(MENTION_PATTERN)?,
        })
    }

    fn find_links(&self, text: &str, options: &RecognizeOptions, found: &mut Vec<Match>) {
        let mut kinds = Vec::with_capacity(2);
        if options.kinds.url {
            kinds.push(LinkKind::Url);
        }
        if options.kinds.email {
            kinds.push(LinkKind::Email);
        }
        if kinds.is_empty() {
            return;
        }

        let mut finder = LinkFinder::new();
        finder.url_must_have_scheme(false);
        finder.kinds(&kinds);

        for link in finder.links(text) {
            let range = link.start()..link.end();
            let matched = link.as_str();
            match link.kind() {
                LinkKind::Email => {
                    found.push(Match::new(EntityKind::Email, matched, matched, range));
                }
                LinkKind::Url => {
                    // Domain tail of an address whose e-mail linking is switched off
                    if preceding_char(text, range.start) == Some('@') || has_bare_userinfo(matched) {
                        continue;
                    }
                    let display = if options.strip_prefix {
                        strip_url_prefix(matched)
                    } else {
                        matched.to_string()
                    };
                    found.push(
                        Match::new(EntityKind::Url, matched, url_href(matched), range)
                            .with_display_text(display),
                    );
                }
                _ => {}
            }
        }
    }

    fn find_phones(&self, text: &str, found: &mut Vec<Match>) {
        for m in self.phone_re.find_iter(text) {
            let (start, end) = (m.start(), m.end());
            let before_ok = preceding_char(text, start).map_or(true, |c| !c.is_alphanumeric());
            let after_ok = text[end..].chars().next().map_or(true, |c| !c.is_alphanumeric());
            if !(before_ok && after_ok) {
                continue;
            }
            let matched = &text[start..end];
            found.push(Match::new(EntityKind::Phone, matched, phone_digits(matched), start..end));
        }
    }

    fn find_prefixed(&self, re: &Regex, kind: EntityKind, text: &str, found: &mut Vec<Match>) {
        for m in re.find_iter(text) {
            let (start, end) = (m.start(), m.end());
            if preceding_char(text, start).is_some_and(is_word_char) {
                continue;
            }
            let matched = &text[start..end];
            // Sigil is a single ASCII byte
            found.push(Match::new(kind, matched, &matched[1..], start..end));
        }
    }
}

impl Recognizer for BuiltinRecognizer {
    fn recognize(&self, text: &str, options: &RecognizeOptions) -> Result<Vec<Match>> {
        let mut found = Vec::new();

        self.find_links(text, options, &mut found);
        if options.kinds.phone {
            self.find_phones(text, &mut found);
        }
        if options.kinds.hashtag {
            self.find_prefixed(&self.hashtag_re, EntityKind::Hashtag, text, &mut found);
        }
        if options.kinds.mention {
            self.find_prefixed(&self.mention_re, EntityKind::Mention, text, &mut found);
        }

        let resolved = resolve_overlaps(found);
        debug!("Builtin recognizer found {} matches in {} bytes", resolved.len(), text.len());
        Ok(resolved)
    }
}

/// Keep the earliest span, preferring the longest one at equal starts
fn resolve_overlaps(mut found: Vec<Match>) -> Vec<Match> {
    found.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| b.range.end.cmp(&a.range.end))
    });

    let mut resolved: Vec<Match> = Vec::with_capacity(found.len());
    let mut last_end = 0;
    for candidate in found {
        if candidate.range.start >= last_end {
            last_end = candidate.range.end;
            resolved.push(candidate);
        }
    }
    resolved
}

fn preceding_char(text: &str, offset: usize) -> Option<char> {
    text[..offset].chars().next_back()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Schemeless URL whose host part looks like `user@domain`
fn has_bare_userinfo(matched: &str) -> bool {
    !matched.contains("://") && matched.split('/').next().is_some_and(|host| host.contains('@'))
}

/// Href for a URL match, adding `http://` when no scheme was written
fn url_href(matched: &str) -> String {
    if matched.contains("://") {
        matched.to_string()
    } else {
        format!("http://{matched}")
    }
}

/// Drop scheme, leading `www.` and a trailing slash from a URL label
pub fn strip_url_prefix(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    let mut rest = url;
    for scheme in ["https://", "http://"] {
        if lower.starts_with(scheme) {
            rest = &url[scheme.len()..];
            break;
        }
    }
    if rest.len() >= 4 && rest[..4].eq_ignore_ascii_case("www.") {
        rest = &rest[4..];
    }
    rest.strip_suffix('/').unwrap_or(rest).to_string()
}

/// Digits of a phone number, keeping a leading `+`
fn phone_digits(matched: &str) -> String {
    let mut digits = String::with_capacity(matched.len());
    if matched.starts_with('+') {
        digits.push('+');
    }
    digits.extend(matched.chars().filter(|c| c.is_ascii_digit()));
    digits
}
