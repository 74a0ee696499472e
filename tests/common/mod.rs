// tests/common/mod.rs
// Scripted collaborators for pipeline tests: a renderer that serves canned
// page text, a completion client that serves canned replies, a mailer that
// records every send, and a store wrapper that fails writes on demand.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use jobwatch::config::{DigestConfig, ExtractionConfig};
use jobwatch::error::{Result, WatchError};
use jobwatch::extract::{CompletionClient, TitleExtractor};
use jobwatch::fingerprint::Fingerprint;
use jobwatch::notify::email::{DigestDispatcher, MailTransport};
use jobwatch::render::PageRenderer;
use jobwatch::scan::Watcher;
use jobwatch::store::{MemoryStore, RecipientStore, SourceStore};

pub struct ScriptedRenderer {
    pages: Mutex<HashMap<String, String>>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
        }
    }

    /// Serve `text` for `url`. Use [`fail`](Self::fail) to make a url error.
    pub fn set_page(&self, url: &str, text: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), text.to_string());
    }

    pub fn fail(&self, url: &str) {
        self.pages.lock().unwrap().remove(url);
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| WatchError::render(url, "navigation timeout"))
    }
}

/// Maps a marker substring of the prompt (i.e. of the page text) to a canned
/// reply. Counts invocations so tests can assert the fingerprint gate held.
pub struct ScriptedCompletion {
    replies: Mutex<Vec<(String, Result<String>)>>,
    pub calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on(&self, marker: &str, reply: &str) {
        self.replies
            .lock()
            .unwrap()
            .push((marker.to_string(), Ok(reply.to_string())));
    }

    pub fn fail_on(&self, marker: &str) {
        self.replies.lock().unwrap().push((
            marker.to_string(),
            Err(WatchError::extraction("completion service unavailable")),
        ));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let replies = self.replies.lock().unwrap();
        for (marker, reply) in replies.iter() {
            if prompt.contains(marker) {
                return match reply {
                    Ok(s) => Ok(s.clone()),
                    Err(_) => Err(WatchError::extraction("completion service unavailable")),
                };
            }
        }
        Ok("[]".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
    failing: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().push(address.to_string());
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        if self.failing.lock().unwrap().iter().any(|a| a == to) {
            return Err(WatchError::dispatch(to, "smtp 550"));
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Delegates to a `MemoryStore` but fails `save_scan` for the named sources.
pub struct FailingStore {
    pub inner: Arc<MemoryStore>,
    fail_saves_for: Vec<String>,
}

impl FailingStore {
    pub fn new(inner: Arc<MemoryStore>, fail_saves_for: &[&str]) -> Self {
        Self {
            inner,
            fail_saves_for: fail_saves_for.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl SourceStore for FailingStore {
    async fn load_sources(&self) -> Result<Vec<jobwatch::Source>> {
        self.inner.load_sources().await
    }

    async fn save_scan(
        &self,
        name: &str,
        fingerprint: &Fingerprint,
        titles: &[String],
    ) -> Result<()> {
        if self.fail_saves_for.iter().any(|s| s == name) {
            return Err(WatchError::persistence(name, "disk full"));
        }
        self.inner.save_scan(name, fingerprint, titles).await
    }
}

#[async_trait]
impl RecipientStore for FailingStore {
    async fn load_recipients(&self) -> Result<Vec<jobwatch::Recipient>> {
        self.inner.load_recipients().await
    }
}

pub struct Rig {
    pub renderer: Arc<ScriptedRenderer>,
    pub completion: Arc<ScriptedCompletion>,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub watcher: Watcher,
}

/// Wire a watcher over scripted collaborators and a shared in-memory store.
pub fn rig() -> Rig {
    let store = Arc::new(MemoryStore::new());
    rig_with_source_store(store.clone(), store)
}

/// Same, but with a custom source-store seam (e.g. [`FailingStore`]).
pub fn rig_with_source_store(
    source_store: Arc<dyn SourceStore>,
    store: Arc<MemoryStore>,
) -> Rig {
    let renderer = Arc::new(ScriptedRenderer::new());
    let completion = Arc::new(ScriptedCompletion::new());
    let mailer = Arc::new(RecordingMailer::new());

    let extractor = TitleExtractor::new(completion.clone(), &ExtractionConfig::default());
    let dispatcher = DigestDispatcher::new(mailer.clone(), DigestConfig::default());
    let watcher = Watcher::new(
        renderer.clone(),
        extractor,
        source_store,
        store.clone(),
        dispatcher,
    );

    Rig {
        renderer,
        completion,
        store,
        mailer,
        watcher,
    }
}
