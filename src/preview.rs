// WHY: the CLI needs a platform that shows what would be opened instead of launching apps
// App-scheme support is simulated from an explicit allow list

use anyhow::Result;
use std::io::Write;
use std::sync::Mutex;
use tracing::info;

use crate::dispatcher::{Platform, ProbeFuture};

/// Platform that records and prints `open <url>` lines
pub struct PreviewPlatform {
    app_schemes: Vec<String>,
    opened: Mutex<Vec<String>>,
    echo: bool,
}

impl PreviewPlatform {
    /// `app_schemes` lists custom schemes (e.g. `twitter`) reported as installed
    pub fn new(app_schemes: Vec<String>) -> Self {
        Self {
            app_schemes: app_schemes
                .into_iter()
                .map(|scheme| scheme.trim_end_matches("://").to_ascii_lowercase())
                .collect(),
            opened: Mutex::new(Vec::new()),
            echo: true,
        }
    }

    /// Record URLs without printing them
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|urls| urls.clone()).unwrap_or_default()
    }

    fn supports(&self, url: &str) -> bool {
        let Some((scheme, _)) = url.split_once(':') else {
            return false;
        };
        let scheme = scheme.to_ascii_lowercase();
        matches!(scheme.as_str(), "http" | "https" | "mailto" | "tel")
            || self.app_schemes.iter().any(|allowed| *allowed == scheme)
    }
}

impl Platform for PreviewPlatform {
    fn open_url(&self, url: &str) -> Result<()> {
        info!(url, "Opening link");
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(url.to_string());
        }
        if self.echo {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "open {url}")?;
        }
        Ok(())
    }

    fn can_open_url(&self, url: &str) -> ProbeFuture {
        let supported = self.supports(url);
        Box::pin(async move { Ok(supported) })
    }
}
