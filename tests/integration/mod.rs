// Integration test utilities and common code
// WHY: Centralized platform double avoids duplication across integration tests

use autolink::{Platform, ProbeFuture};
use std::sync::{Arc, Mutex};

/// How the fake platform answers "can this URL be opened"
#[derive(Debug, Clone, Copy)]
pub enum ProbeAnswer {
    Supported,
    Unsupported,
    Rejects,
}

/// Platform double recording every opened URL and every probe
pub struct RecordingPlatform {
    answer: ProbeAnswer,
    opened: Mutex<Vec<String>>,
    probed: Mutex<Vec<String>>,
}

impl RecordingPlatform {
    pub fn new(answer: ProbeAnswer) -> Arc<Self> {
        Arc::new(Self {
            answer,
            opened: Mutex::new(Vec::new()),
            probed: Mutex::new(Vec::new()),
        })
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("opened lock poisoned").clone()
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().expect("probed lock poisoned").clone()
    }
}

impl Platform for RecordingPlatform {
    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        self.opened.lock().expect("opened lock poisoned").push(url.to_string());
        Ok(())
    }

    fn can_open_url(&self, url: &str) -> ProbeFuture {
        self.probed.lock().expect("probed lock poisoned").push(url.to_string());
        let answer = self.answer;
        Box::pin(async move {
            match answer {
                ProbeAnswer::Supported => Ok(true),
                ProbeAnswer::Unsupported => Ok(false),
                ProbeAnswer::Rejects => Err(anyhow::anyhow!("capability check rejected")),
            }
        })
    }
}
