// WHY: engines that only hand back rewritten text lose match offsets
// Each match is swapped for an unguessable placeholder and recovered from a side table afterwards

use anyhow::{bail, Result};
use rand::Rng;
use regex_automata::meta::Regex;
use std::collections::HashMap;
use tracing::debug;

use super::{push_match, push_text, Part};
use crate::config::Configuration;
use crate::recognizer::{Match, RewriteEngine};

const TOKEN_OPEN: &str = "@__ELEMENT-";
const TOKEN_CLOSE: &str = "__@";

/// Piece of rewritten engine output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'t> {
    Text(&'t str),
    Token(&'t str),
}

/// Issues `@__ELEMENT-<uid>-<n>__@` placeholders for one segmentation pass
pub struct TokenGenerator {
    prefix: String,
    counter: usize,
    pattern: Regex,
}

impl TokenGenerator {
    /// Build a generator whose random prefix does not occur anywhere in `text`
    pub fn for_text(text: &str) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let uid = loop {
            let candidate = format!("{:x}", rng.gen_range(0x1000_0000u64..0x100_0000_0000u64));
            if !text.contains(&format!("{TOKEN_OPEN}{candidate}-")) {
                break candidate;
            }
        };
        Self::with_uid(&uid)
    }

    fn with_uid(uid: &str) -> Result<Self> {
        let prefix = format!("{TOKEN_OPEN}{uid}-");
        let pattern = Regex::new(&format!("{TOKEN_OPEN}{uid}-[0-9]+{TOKEN_CLOSE}"))?;
        Ok(Self {
            prefix,
            counter: 0,
            pattern,
        })
    }

    /// Next placeholder; numbering starts at 0 and never repeats within a pass
    pub fn next_token(&mut self) -> String {
        let token = format!("{}{}{}", self.prefix, self.counter, TOKEN_CLOSE);
        self.counter += 1;
        token
    }

    /// Split `rewritten` around every placeholder, keeping placeholders as their own fragments
    pub fn split<'t>(&self, rewritten: &'t str) -> Vec<Fragment<'t>> {
        let mut fragments = Vec::new();
        let mut cursor = 0;
        for m in self.pattern.find_iter(rewritten) {
            if m.start() > cursor {
                fragments.push(Fragment::Text(&rewritten[cursor..m.start()]));
            }
            fragments.push(Fragment::Token(&rewritten[m.start()..m.end()]));
            cursor = m.end();
        }
        if cursor < rewritten.len() {
            fragments.push(Fragment::Text(&rewritten[cursor..]));
        }
        fragments
    }
}

/// Segment `text` through an engine that only returns rewritten text
///
/// The engine is invoked once. Every match it reports is recorded under a fresh
/// placeholder, which the engine writes into its output in place of the match.
/// Output that repeats, drops or invents a placeholder is an error, so no
/// placeholder ever reaches the returned parts.
pub fn segment_rewritten<E: RewriteEngine + ?Sized>(
    text: &str,
    config: &Configuration,
    engine: &E,
) -> Result<Vec<Part>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let options = config.recognize_options();
    let mut tokens = TokenGenerator::for_text(text)?;
    let mut matches: HashMap<String, Match> = HashMap::new();

    let rewritten = engine.rewrite(text, &options, &mut |found| {
        let token = tokens.next_token();
        matches.insert(token.clone(), found);
        token
    })?;

    let mut parts = Vec::new();
    for fragment in tokens.split(&rewritten) {
        match fragment {
            Fragment::Text(literal) => push_text(&mut parts, literal),
            Fragment::Token(token) => match matches.remove(token) {
                Some(found) => push_match(&mut parts, found, &options.kinds),
                None => bail!("Engine output repeats or invents placeholder {}", token),
            },
        }
    }
    if !matches.is_empty() {
        bail!("Engine output dropped {} of its matches", matches.len());
    }

    debug!("Token pass over {} bytes produced {} parts", text.len(), parts.len());
    Ok(parts)
}
