// WHY: link labels are shortened in the middle so both the host and the path tail stay readable
// All lengths are counted in characters, never bytes, so multi-byte labels are never split

use regex_automata::meta::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Pieces of a URL-ish label; empty pieces count as absent
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct UrlParts {
    scheme: String,
    host: String,
    path: String,
    query: String,
    fragment: String,
}

/// scheme, host, path, query, fragment; every group optional so any label matches
const URL_PARTS_PATTERN: &str = r"(?s)^(?:([A-Za-z]+)://)?([^?#/]*)(?:/([^?#]*))?(?:\?([^#]*))?(?:#(.*))?$";

fn url_parts_regex() -> Option<&'static Regex> {
    static URL_PARTS: OnceLock<Option<Regex>> = OnceLock::new();
    URL_PARTS
        .get_or_init(|| match Regex::new(URL_PARTS_PATTERN) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("URL label pattern failed to compile, labels are cut as plain text: {}", e);
                None
            }
        })
        .as_ref()
}

impl UrlParts {
    fn parse(url: &str) -> Self {
        let Some(regex) = url_parts_regex() else {
            return UrlParts {
                host: url.to_string(),
                ..UrlParts::default()
            };
        };
        let mut caps = regex.create_captures();
        regex.captures(url, &mut caps);
        let group = |index: usize| {
            caps.get_group(index)
                .map(|span| url[span.start..span.end].to_string())
                .unwrap_or_default()
        };
        UrlParts {
            scheme: group(1),
            host: group(2),
            path: group(3),
            query: group(4),
            fragment: group(5),
        }
    }

    fn build(&self) -> String {
        let mut url = String::new();
        if !self.scheme.is_empty() && !self.host.is_empty() {
            url.push_str(&self.scheme);
            url.push_str("://");
        }
        url.push_str(&self.host);
        if !self.path.is_empty() {
            url.push('/');
            url.push_str(&self.path);
        }
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&self.query);
        }
        if !self.fragment.is_empty() {
            url.push('#');
            url.push_str(&self.fragment);
        }
        url
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn head(text: &str, count: usize) -> String {
    text.chars().take(count).collect()
}

fn tail(text: &str, count: usize) -> String {
    let len = char_len(text);
    text.chars().skip(len.saturating_sub(count)).collect()
}

/// Head of `segment`, the marker, then the tail, sharing `available` characters
fn build_segment(segment: &str, available: i64, marker: &str) -> String {
    let half = available as f64 / 2.0;
    let head_len = half.ceil().max(0.0) as usize;
    let tail_len = half.floor().max(0.0) as usize;
    format!("{}{}{}", head(segment, head_len), marker, tail(segment, tail_len))
}

/// Shorten `text` to at most `max_len` characters, keeping its recognizable start and end
///
/// Text already short enough is returned unchanged, and `max_len == 0` disables
/// truncation. URL-shaped text loses a duplicated query, a leading `www.` and
/// finally the middle of its host, path or fragment, replaced by `marker`.
pub fn truncate_smart(text: &str, max_len: usize, marker: &str) -> String {
    if max_len == 0 || char_len(text) <= max_len {
        return text.to_string();
    }

    let limit = max_len as i64;
    let available = limit - char_len(marker) as i64;
    let mut parts = UrlParts::parse(text);
    let mut url = text.to_string();

    // A second `?` marks a malformed query; everything after it goes
    if let Some(second) = parts.query.find('?') {
        parts.query.truncate(second);
        url = parts.build();
    }
    if char_len(&url) <= max_len {
        return url;
    }

    if let Some(bare) = parts.host.strip_prefix("www.") {
        parts.host = bare.to_string();
        url = parts.build();
    }
    if char_len(&url) <= max_len {
        return url;
    }

    let mut shortened = parts.host.clone();
    if char_len(&shortened) as i64 >= available {
        if char_len(&parts.host) == max_len {
            let keep = available.max(0) as usize;
            return head(&format!("{}{}", head(&parts.host, keep), marker), max_len);
        }
        return head(&build_segment(&shortened, available, marker), max_len);
    }

    let mut path_and_query = String::new();
    if !parts.path.is_empty() {
        path_and_query.push('/');
        path_and_query.push_str(&parts.path);
    }
    if !parts.query.is_empty() {
        path_and_query.push('?');
        path_and_query.push_str(&parts.query);
    }
    if !path_and_query.is_empty() {
        if let Some(done) = fit_piece(&shortened, &path_and_query, available, max_len, marker) {
            return done;
        }
        shortened.push_str(&path_and_query);
    }

    if !parts.fragment.is_empty() {
        let fragment = format!("#{}", parts.fragment);
        if let Some(done) = fit_piece(&shortened, &fragment, available, max_len, marker) {
            return done;
        }
        shortened.push_str(&fragment);
    }

    if !parts.scheme.is_empty() && !parts.host.is_empty() {
        let scheme = format!("{}://", parts.scheme);
        if ((char_len(&shortened) + char_len(&scheme)) as i64) < available {
            return head(&format!("{scheme}{shortened}"), max_len);
        }
    }

    if char_len(&shortened) <= max_len {
        return shortened;
    }

    let tail_len = if available > 0 { (available / 2) as usize } else { 0 };
    let head_len = if available > 0 { ((available + 1) / 2) as usize } else { 0 };
    head(
        &format!("{}{}{}", head(&shortened, head_len), marker, tail(&shortened, tail_len)),
        max_len,
    )
}

/// Append `piece` to `prefix` if it fits, otherwise shorten `piece` to fill the limit
fn fit_piece(prefix: &str, piece: &str, available: i64, max_len: usize, marker: &str) -> Option<String> {
    let combined_len = char_len(prefix) + char_len(piece);
    if (combined_len as i64) < available {
        return None;
    }
    if combined_len == max_len {
        return Some(format!("{prefix}{piece}"));
    }
    let remaining = available - char_len(prefix) as i64;
    Some(head(
        &format!("{}{}", prefix, build_segment(piece, remaining, marker)),
        max_len,
    ))
}
