// WHY: maps an activated match to exactly one platform "open" action
// Social links probe for the native app first and fall back to the web profile or search page

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::{Configuration, HashtagPlatform};
use crate::recognizer::{EntityKind, Match};

/// Characters left as-is by `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Result of a "can this URL be opened" query
pub type ProbeFuture = BoxFuture<'static, Result<bool>>;

/// Host capability for opening URLs and custom schemes
pub trait Platform: Send + Sync {
    /// Open `url`; a single attempt, never retried
    fn open_url(&self, url: &str) -> Result<()>;

    /// Resolve to whether some installed handler accepts `url`
    fn can_open_url(&self, url: &str) -> ProbeFuture;
}

/// Caller-supplied replacement for the built-in press behavior
pub type PressHandler = Arc<dyn Fn(&Match) + Send + Sync>;

/// What activating a match should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Open this URL directly
    Open(String),
    /// Open `app_url` if the platform accepts it, otherwise `web_url`
    Probe { app_url: String, web_url: String },
}

/// A URL that was handed to the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    pub url: String,
    /// Set when the platform refused to open the URL
    pub error: Option<String>,
}

/// Outcome of one activation
pub enum Activation {
    /// A custom press handler took over; nothing was opened
    Handled,
    /// A URL was opened without probing
    Opened(Opened),
    /// The probe is running in the background
    Probing(JoinHandle<Opened>),
}

impl Activation {
    /// Wait for the side effect of this activation, if there is one
    pub async fn settle(self) -> Option<Opened> {
        match self {
            Activation::Handled => None,
            Activation::Opened(opened) => Some(opened),
            Activation::Probing(handle) => match handle.await {
                Ok(opened) => Some(opened),
                Err(e) => {
                    warn!("Link probe task failed: {}", e);
                    None
                }
            },
        }
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Handled => f.write_str("Handled"),
            Activation::Opened(opened) => f.debug_tuple("Opened").field(opened).finish(),
            Activation::Probing(_) => f.write_str("Probing"),
        }
    }
}

/// Percent-encode a value the way `encodeURIComponent` does
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Decides and performs the open action for activated matches
#[derive(Clone)]
pub struct Dispatcher {
    platform: Arc<dyn Platform>,
    hashtag: HashtagPlatform,
    press_handler: Option<PressHandler>,
    runtime: Option<Handle>,
}

impl Dispatcher {
    pub fn new(platform: Arc<dyn Platform>, config: &Configuration) -> Self {
        Self {
            platform,
            hashtag: config.hashtag,
            press_handler: None,
            runtime: None,
        }
    }

    /// Spawn probes on `runtime` instead of the runtime current at dispatch time
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Route every activation to `handler` instead of the platform
    pub fn with_press_handler(mut self, handler: PressHandler) -> Self {
        self.press_handler = Some(handler);
        self
    }

    /// The action the built-in behavior takes for `found`
    pub fn resolve(&self, found: &Match) -> LinkAction {
        match found.kind {
            EntityKind::Email => {
                LinkAction::Open(format!("mailto:{}", encode_component(&found.canonical_value)))
            }
            EntityKind::Phone => LinkAction::Open(format!("tel:{}", found.canonical_value)),
            EntityKind::Url => LinkAction::Open(found.canonical_value.clone()),
            EntityKind::Hashtag => {
                let tag = encode_component(&found.canonical_value);
                match self.hashtag {
                    HashtagPlatform::Instagram => {
                        LinkAction::Open(format!("instagram://tag?name={tag}"))
                    }
                    HashtagPlatform::Twitter => LinkAction::Probe {
                        app_url: format!("twitter://search?query=%23{tag}"),
                        web_url: format!("https://www.twitter.com/search?q=%23{tag}"),
                    },
                    HashtagPlatform::Off => LinkAction::Open(found.matched_text.clone()),
                }
            }
            EntityKind::Mention => {
                let handle = encode_component(&found.canonical_value);
                LinkAction::Probe {
                    app_url: format!("twitter://user?screen_name={handle}"),
                    web_url: format!("https://www.twitter.com/{handle}"),
                }
            }
            EntityKind::Other => LinkAction::Open(found.matched_text.clone()),
        }
    }

    /// Activate `found`: run the press handler, or open its URL
    ///
    /// Probes are spawned and never awaited here: on the configured runtime, else
    /// the current one, else a shared background runtime owned by this module.
    pub fn dispatch(&self, found: &Match) -> Activation {
        if let Some(handler) = &self.press_handler {
            debug!("Custom press handler for {} match", found.kind.as_str());
            handler(found);
            return Activation::Handled;
        }

        match self.resolve(found) {
            LinkAction::Open(url) => {
                debug!("Opening {} for {} match", url, found.kind.as_str());
                Activation::Opened(open_with(self.platform.as_ref(), url))
            }
            LinkAction::Probe { app_url, web_url } => {
                debug!("Probing {} for {} match", app_url, found.kind.as_str());
                match self.probe_runtime() {
                    Ok(runtime) => {
                        let probe = probe_then_open(Arc::clone(&self.platform), app_url, web_url);
                        Activation::Probing(runtime.spawn(probe))
                    }
                    Err(e) => {
                        warn!("No runtime for probing {}, using web fallback: {:#}", app_url, e);
                        Activation::Opened(open_with(self.platform.as_ref(), web_url))
                    }
                }
            }
        }
    }

    fn probe_runtime(&self) -> Result<Handle> {
        if let Some(runtime) = &self.runtime {
            return Ok(runtime.clone());
        }
        if let Ok(runtime) = Handle::try_current() {
            return Ok(runtime);
        }
        background_runtime().map(|runtime| runtime.handle().clone())
    }
}

// WHY: callers without a tokio runtime (plain threads, UI loops) still get a non-blocking probe
fn background_runtime() -> Result<&'static Runtime> {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime);
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("autolink-probe")
        .enable_all()
        .build()
        .context("Failed to start probe runtime")?;
    Ok(RUNTIME.get_or_init(|| runtime))
}

fn open_with(platform: &dyn Platform, url: String) -> Opened {
    match platform.open_url(&url) {
        Ok(()) => Opened { url, error: None },
        Err(e) => {
            warn!("Failed to open {}: {}", url, e);
            Opened {
                url,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn probe_then_open(platform: Arc<dyn Platform>, app_url: String, web_url: String) -> Opened {
    let supported = match platform.can_open_url(&app_url).await {
        Ok(supported) => supported,
        Err(e) => {
            warn!("Probe for {} failed, using web fallback: {}", app_url, e);
            false
        }
    };
    let url = if supported { app_url } else { web_url };
    open_with(platform.as_ref(), url)
}
