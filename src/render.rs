// WHY: turns segmented parts into a toolkit-neutral node list
// Literal text passes through untouched; matches become labelled, activatable link nodes

use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;

use crate::config::{Configuration, DEFAULT_LINK_COLOR};
use crate::dispatcher::{Activation, Dispatcher, LinkAction};
use crate::recognizer::Match;
use crate::segmenter::Part;
use crate::truncate::truncate_smart;

/// Caller-supplied link renderer: `(display_text, match, part_index) -> node`
pub type LinkRenderer = Arc<dyn Fn(&str, &Match, usize) -> Node + Send + Sync>;

/// A rendered link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkNode {
    /// Display text after truncation
    pub label: String,
    /// Position of the originating part
    pub index: usize,
    pub color: String,
    #[serde(rename = "match")]
    pub found: Match,
}

impl LinkNode {
    /// Run the dispatcher for this link, as a press on it would
    pub fn activate(&self, dispatcher: &Dispatcher) -> Activation {
        dispatcher.dispatch(&self.found)
    }
}

/// Renderable unit produced from one part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Text { text: String },
    Link(LinkNode),
    /// Output of a caller-supplied renderer
    Custom { content: String },
}

impl Node {
    pub fn as_link(&self) -> Option<&LinkNode> {
        match self {
            Node::Link(link) => Some(link),
            _ => None,
        }
    }
}

/// Map parts to nodes, truncating link labels per `config`
pub fn render_parts(
    parts: Vec<Part>,
    config: &Configuration,
    renderer: Option<&LinkRenderer>,
) -> Vec<Node> {
    parts
        .into_iter()
        .enumerate()
        .map(|(index, part)| match part {
            Part::Text { text } => Node::Text { text },
            Part::Link { found } if !found.kind.is_linkable() => Node::Text {
                text: found.matched_text,
            },
            Part::Link { found } => match renderer {
                Some(render) => render(&found.display_text, &found, index),
                None => Node::Link(LinkNode {
                    label: truncate_smart(&found.display_text, config.truncate, &config.truncate_chars),
                    index,
                    color: DEFAULT_LINK_COLOR.to_string(),
                    found,
                }),
            },
        })
        .collect()
}

/// Visible text of the nodes, links shown by their labels
pub fn to_plain_text(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            Node::Text { text } => text.as_str(),
            Node::Link(link) => link.label.as_str(),
            Node::Custom { content } => content.as_str(),
        })
        .collect()
}

fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Drop control characters so text cannot terminate or inject escape sequences
fn strip_controls(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

/// Write nodes for a terminal: colored labels wrapped in OSC 8 hyperlinks
///
/// Probed links point at their web URL since a terminal cannot ask for app support.
pub fn write_ansi<W: Write>(nodes: &[Node], dispatcher: &Dispatcher, out: &mut W) -> io::Result<()> {
    for node in nodes {
        match node {
            Node::Text { text } => out.write_all(text.as_bytes())?,
            Node::Custom { content } => out.write_all(content.as_bytes())?,
            Node::Link(link) => {
                let href = match dispatcher.resolve(&link.found) {
                    LinkAction::Open(url) => url,
                    LinkAction::Probe { web_url, .. } => web_url,
                };
                if let Some((r, g, b)) = parse_hex_color(&link.color) {
                    write!(out, "\x1b[38;2;{r};{g};{b}m")?;
                }
                let href = strip_controls(&href);
                let label = strip_controls(&link.label);
                write!(out, "\x1b]8;;{href}\x1b\\{label}\x1b]8;;\x1b\\\x1b[0m")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{Platform, ProbeFuture};
    use crate::recognizer::EntityKind;

    struct NullPlatform;

    impl Platform for NullPlatform {
        fn open_url(&self, _url: &str) -> anyhow::Result<()> {
            Ok(())
        }
        fn can_open_url(&self, _url: &str) -> ProbeFuture {
            Box::pin(async { Ok(true) })
        }
    }

    fn url_part(text: &str) -> Part {
        Part::Link {
            found: Match::new(EntityKind::Url, text, format!("http://{text}"), 0..text.len()),
        }
    }

    #[test]
    fn test_literal_parts_pass_through() {
        let nodes = render_parts(
            vec![Part::Text {
                text: "plain".to_string(),
            }],
            &Configuration::default(),
            None,
        );
        assert_eq!(
            nodes,
            vec![Node::Text {
                text: "plain".to_string()
            }]
        );
    }

    #[test]
    fn test_link_label_is_truncated() {
        let nodes = render_parts(
            vec![url_part("github.com/joshswan/react-native-autolink")],
            &Configuration::default(),
            None,
        );
        let link = nodes[0].as_link().unwrap();
        assert_eq!(link.label, "github.com/joshswan/..e-autolink");
        assert_eq!(link.found.matched_text, "github.com/joshswan/react-native-autolink");
        assert_eq!(link.color, "#0E7AFE");
    }

    #[test]
    fn test_other_kind_renders_as_text() {
        let parts = vec![Part::Link {
            found: Match::new(EntityKind::Other, "thing", "thing", 0..5),
        }];
        let nodes = render_parts(parts, &Configuration::default(), None);
        assert_eq!(
            nodes,
            vec![Node::Text {
                text: "thing".to_string()
            }]
        );
    }

    #[test]
    fn test_custom_renderer_gets_untruncated_label_and_index() {
        let renderer: LinkRenderer = Arc::new(|text: &str, _found: &Match, index: usize| Node::Custom {
            content: format!("{text}:{index}"),
        });
        let parts = vec![
            Part::Text {
                text: "see ".to_string(),
            },
            url_part("github.com/joshswan/react-native-autolink"),
        ];
        let nodes = render_parts(parts, &Configuration::default(), Some(&renderer));
        assert_eq!(
            nodes[1],
            Node::Custom {
                content: "github.com/joshswan/react-native-autolink:1".to_string()
            }
        );
    }

    #[test]
    fn test_plain_text_uses_labels() {
        let nodes = vec![
            Node::Text {
                text: "go to ".to_string(),
            },
            render_parts(vec![url_part("a.com")], &Configuration::default(), None).remove(0),
        ];
        assert_eq!(to_plain_text(&nodes), "go to a.com");
    }

    #[test]
    fn test_write_ansi_emits_hyperlink() {
        let dispatcher = Dispatcher::new(Arc::new(NullPlatform), &Configuration::default());
        let nodes = render_parts(vec![url_part("a.com")], &Configuration::default(), None);
        let mut out = Vec::new();
        write_ansi(&nodes, &dispatcher, &mut out).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert!(written.contains("\x1b]8;;http://a.com\x1b\\a.com"));
        assert!(written.starts_with("\x1b[38;2;14;122;254m"));
    }

    #[test]
    fn test_write_ansi_strips_escapes_from_label() {
        let dispatcher = Dispatcher::new(Arc::new(NullPlatform), &Configuration::default());
        let mut nodes = render_parts(vec![url_part("a.com")], &Configuration::default(), None);
        if let Node::Link(link) = &mut nodes[0] {
            link.label = "a\x1b]8;;http://evil\x1b\\.com\n".to_string();
        }
        let mut out = Vec::new();
        write_ansi(&nodes, &dispatcher, &mut out).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert!(written.contains("\x1b\\a]8;;http://evil\\.com\x1b]8;;\x1b\\"));
        assert!(!written.contains('\n'));
        // color, two for the hyperlink open, two for its close, reset
        assert_eq!(written.matches('\x1b').count(), 6);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#0E7AFE"), Some((14, 122, 254)));
        assert_eq!(parse_hex_color("0E7AFE"), None);
        assert_eq!(parse_hex_color("#xyzxyz"), None);
    }
}
