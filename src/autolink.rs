// WHY: single entry point bundling configuration, recognizer, dispatcher and renderer
// Recognition failures stop here: they are logged and the caller gets no interactive content

use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

use crate::config::Configuration;
use crate::dispatcher::{Activation, Dispatcher, Platform, PressHandler};
use crate::recognizer::{BuiltinRecognizer, Recognizer, RewriteEngine};
use crate::render::{render_parts, LinkNode, LinkRenderer, Node};
use crate::segmenter::{segment, segment_rewritten, Part};

/// Recognition engine and the segmentation technique it needs
enum Engine {
    /// Reports match offsets; segmented directly from spans
    Spans(Box<dyn Recognizer + Send + Sync>),
    /// Only returns rewritten text; segmented through placeholders
    Rewrite(Box<dyn RewriteEngine + Send + Sync>),
}

/// Links entities in text and opens them on activation
pub struct Autolink {
    config: Configuration,
    engine: Engine,
    dispatcher: Dispatcher,
    link_renderer: Option<LinkRenderer>,
}

impl Autolink {
    /// Create with the builtin recognizer
    pub fn new(config: Configuration, platform: Arc<dyn Platform>) -> Result<Self> {
        let dispatcher = Dispatcher::new(platform, &config);
        Ok(Self {
            config,
            engine: Engine::Spans(Box::new(BuiltinRecognizer::new()?)),
            dispatcher,
            link_renderer: None,
        })
    }

    /// Replace the recognition engine
    pub fn with_recognizer(mut self, recognizer: Box<dyn Recognizer + Send + Sync>) -> Self {
        self.engine = Engine::Spans(recognizer);
        self
    }

    /// Use an engine that only returns rewritten text
    pub fn with_rewrite_engine(mut self, engine: Box<dyn RewriteEngine + Send + Sync>) -> Self {
        self.engine = Engine::Rewrite(engine);
        self
    }

    /// Send activations to `handler` instead of opening anything
    pub fn with_press_handler(mut self, handler: PressHandler) -> Self {
        self.dispatcher = self.dispatcher.with_press_handler(handler);
        self
    }

    pub fn with_link_renderer(mut self, renderer: LinkRenderer) -> Self {
        self.link_renderer = Some(renderer);
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Segment `text` without rendering
    pub fn segment(&self, text: &str) -> Result<Vec<Part>> {
        match &self.engine {
            Engine::Spans(recognizer) => segment(text, &self.config, recognizer.as_ref()),
            Engine::Rewrite(engine) => segment_rewritten(text, &self.config, engine.as_ref()),
        }
    }

    /// Render `text` into nodes, or `None` when the recognizer rejects it
    pub fn render(&self, text: &str) -> Option<Vec<Node>> {
        match self.segment(text) {
            Ok(parts) => Some(render_parts(parts, &self.config, self.link_renderer.as_ref())),
            Err(e) => {
                warn!("Autolink could not recognize entities: {:#}", e);
                None
            }
        }
    }

    /// Activate a rendered link
    pub fn activate(&self, link: &LinkNode) -> Activation {
        link.activate(&self.dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashtagPlatform;
    use crate::dispatcher::ProbeFuture;
    use crate::recognizer::{EntityKind, Match, RecognizeOptions};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPlatform {
        opened: Mutex<Vec<String>>,
    }

    impl Platform for RecordingPlatform {
        fn open_url(&self, url: &str) -> Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
        fn can_open_url(&self, _url: &str) -> ProbeFuture {
            Box::pin(async { Ok(false) })
        }
    }

    struct BrokenRecognizer;

    impl Recognizer for BrokenRecognizer {
        fn recognize(&self, _text: &str, _options: &RecognizeOptions) -> Result<Vec<Match>> {
            anyhow::bail!("malformed input")
        }
    }

    #[test]
    fn test_render_links_every_enabled_kind() {
        let config = Configuration {
            hashtag: HashtagPlatform::Instagram,
            mention: true,
            ..Configuration::default()
        };
        let autolink = Autolink::new(config, Arc::new(RecordingPlatform::default())).unwrap();
        let nodes = autolink
            .render("Hi @josh (josh@sportifik.com or 415-555-5555), check out https://github.com/joshswan/react-native-autolink. It's #awesome!")
            .unwrap();
        assert_eq!(nodes.iter().filter(|n| n.as_link().is_some()).count(), 5);
    }

    #[test]
    fn test_recognizer_failure_renders_nothing() {
        let autolink = Autolink::new(Configuration::default(), Arc::new(RecordingPlatform::default()))
            .unwrap()
            .with_recognizer(Box::new(BrokenRecognizer));
        assert!(autolink.render("josh@sportifik.com").is_none());
    }

    /// Links every occurrence of one word, reporting only rewritten text
    struct WordEngine(&'static str);

    impl RewriteEngine for WordEngine {
        fn rewrite(
            &self,
            text: &str,
            _options: &RecognizeOptions,
            replace: &mut dyn FnMut(Match) -> String,
        ) -> Result<String> {
            let mut out = String::new();
            let mut cursor = 0;
            for (start, word) in text.match_indices(self.0) {
                out.push_str(&text[cursor..start]);
                let url = format!("https://{word}.example");
                out.push_str(&replace(Match::new(EntityKind::Url, word, url, start..start + word.len())));
                cursor = start + word.len();
            }
            out.push_str(&text[cursor..]);
            Ok(out)
        }
    }

    struct BrokenEngine;

    impl RewriteEngine for BrokenEngine {
        fn rewrite(
            &self,
            _text: &str,
            _options: &RecognizeOptions,
            _replace: &mut dyn FnMut(Match) -> String,
        ) -> Result<String> {
            anyhow::bail!("engine crashed")
        }
    }

    #[test]
    fn test_rewrite_engine_links_text() {
        let platform = Arc::new(RecordingPlatform::default());
        let autolink = Autolink::new(Configuration::default(), platform.clone())
            .unwrap()
            .with_rewrite_engine(Box::new(WordEngine("docs")));
        let nodes = autolink.render("read the docs, then the docs again").unwrap();
        let links: Vec<_> = nodes.iter().filter_map(Node::as_link).collect();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].label, "docs");
        assert!(nodes.iter().all(|n| !format!("{n:?}").contains("@__ELEMENT-")));

        autolink.activate(links[1]);
        assert_eq!(*platform.opened.lock().unwrap(), vec!["https://docs.example"]);
    }

    #[test]
    fn test_rewrite_engine_failure_renders_nothing() {
        let autolink = Autolink::new(Configuration::default(), Arc::new(RecordingPlatform::default()))
            .unwrap()
            .with_rewrite_engine(Box::new(BrokenEngine));
        assert!(autolink.render("josh@sportifik.com").is_none());
        assert!(autolink.segment("josh@sportifik.com").is_err());
    }

    #[test]
    fn test_activate_email_opens_mailto() {
        let platform = Arc::new(RecordingPlatform::default());
        let autolink = Autolink::new(Configuration::default(), platform.clone()).unwrap();
        let nodes = autolink.render("josh@x.com").unwrap();
        let link = nodes[0].as_link().unwrap();
        autolink.activate(link);
        assert_eq!(*platform.opened.lock().unwrap(), vec!["mailto:josh%40x.com"]);
    }
}
