// src/store.rs
// Storage seams for sources and recipients, plus the two built-in backends:
// a JSON-file store for the binary and an in-memory store for tests and dev.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Result, WatchError};
use crate::fingerprint::Fingerprint;
use crate::types::{Recipient, Source};

#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn load_sources(&self) -> Result<Vec<Source>>;

    /// Persist the outcome of one scan: fingerprint and full replacement title
    /// list for a single source, as one write.
    async fn save_scan(&self, name: &str, fingerprint: &Fingerprint, titles: &[String])
        -> Result<()>;
}

#[async_trait]
pub trait RecipientStore: Send + Sync {
    async fn load_recipients(&self) -> Result<Vec<Recipient>>;
}

/// File-backed store: `sources.json` and `recipients.json` under a state
/// directory. Writes go through a temp file and rename so a crashed write
/// never leaves a half-written record behind.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn sources_path(&self) -> PathBuf {
        self.dir.join("sources.json")
    }

    fn recipients_path(&self) -> PathBuf {
        self.dir.join("recipients.json")
    }

    async fn read_sources(&self) -> Result<Vec<Source>> {
        read_json(&self.sources_path()).await
    }

    async fn write_sources(&self, sources: &[Source]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.sources_path();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(sources)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(tmp, path).await
    }

    /// Seed helper for tools and tests; the admin surface proper is external.
    pub async fn seed(&self, sources: &[Source], recipients: &[Recipient]) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        self.write_sources(sources).await?;
        let json = serde_json::to_vec_pretty(recipients)?;
        tokio::fs::write(self.recipients_path(), json).await?;
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match tokio::fs::read_to_string(path).await {
        Ok(s) => serde_json::from_str(&s).map_err(|e| {
            WatchError::persistence(path.display().to_string(), format!("corrupt JSON: {e}"))
        }),
        // Missing file means nothing registered yet.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(WatchError::persistence(path.display().to_string(), e)),
    }
}

#[async_trait]
impl SourceStore for JsonStore {
    async fn load_sources(&self) -> Result<Vec<Source>> {
        self.read_sources().await
    }

    async fn save_scan(
        &self,
        name: &str,
        fingerprint: &Fingerprint,
        titles: &[String],
    ) -> Result<()> {
        let mut sources = self.read_sources().await?;
        let source = sources
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| WatchError::persistence(name, "unknown source"))?;
        source.fingerprint = fingerprint.clone();
        source.known_titles = titles.to_vec();
        source.last_scanned_at = Some(chrono::Utc::now());
        self.write_sources(&sources)
            .await
            .map_err(|e| WatchError::persistence(name, e))
    }
}

#[async_trait]
impl RecipientStore for JsonStore {
    async fn load_recipients(&self) -> Result<Vec<Recipient>> {
        read_json(&self.recipients_path()).await
    }
}

/// In-memory store. Data is lost on drop; useful for tests and local runs.
#[derive(Default)]
pub struct MemoryStore {
    sources: RwLock<HashMap<String, Source>>,
    order: RwLock<Vec<String>>,
    recipients: RwLock<Vec<Recipient>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_source(&self, source: Source) {
        let mut order = self.order.write().expect("poisoned order");
        if !order.contains(&source.name) {
            order.push(source.name.clone());
        }
        self.sources
            .write()
            .expect("poisoned sources")
            .insert(source.name.clone(), source);
    }

    pub fn insert_recipient(&self, recipient: Recipient) {
        self.recipients
            .write()
            .expect("poisoned recipients")
            .push(recipient);
    }

    pub fn get_source(&self, name: &str) -> Option<Source> {
        self.sources
            .read()
            .expect("poisoned sources")
            .get(name)
            .cloned()
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn load_sources(&self) -> Result<Vec<Source>> {
        let sources = self.sources.read().expect("poisoned sources");
        let order = self.order.read().expect("poisoned order");
        Ok(order.iter().filter_map(|n| sources.get(n).cloned()).collect())
    }

    async fn save_scan(
        &self,
        name: &str,
        fingerprint: &Fingerprint,
        titles: &[String],
    ) -> Result<()> {
        let mut sources = self.sources.write().expect("poisoned sources");
        let source = sources
            .get_mut(name)
            .ok_or_else(|| WatchError::persistence(name, "unknown source"))?;
        source.fingerprint = fingerprint.clone();
        source.known_titles = titles.to_vec();
        source.last_scanned_at = Some(chrono::Utc::now());
        Ok(())
    }
}

#[async_trait]
impl RecipientStore for MemoryStore {
    async fn load_recipients(&self) -> Result<Vec<Recipient>> {
        Ok(self.recipients.read().expect("poisoned recipients").clone())
    }
}
