// src/config.rs
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_language() -> String {
    "English".to_string()
}
fn default_domains() -> Vec<String> {
    vec![
        "Software Engineering".to_string(),
        "Hardware Engineering".to_string(),
        "Embedded Coding".to_string(),
    ]
}
fn default_max_page_chars() -> usize {
    12_000
}
fn default_connect_timeout() -> u64 {
    4
}
fn default_request_timeout() -> u64 {
    30
}
fn default_subject() -> String {
    "Your daily job updates!".to_string()
}
fn default_signoff() -> String {
    "Best regards,\nThe JobWatch team".to_string()
}
fn default_state_dir() -> String {
    "state".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Natural language a title must be written in to count.
    #[serde(default = "default_language")]
    pub language: String,
    /// Professional domains a title must align with.
    #[serde(default = "default_domains")]
    pub domains: Vec<String>,
    /// Page text is truncated to this many chars before prompting.
    #[serde(default = "default_max_page_chars")]
    pub max_page_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            language: default_language(),
            domains: default_domains(),
            max_page_chars: default_max_page_chars(),
        }
    }
}

/// Timeouts for the renderer and completion clients. Bounded so one
/// unresponsive source cannot stall the whole cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_signoff")]
    pub signoff: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            signoff: default_signoff(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub digest: DigestConfig,
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            http: HttpConfig::default(),
            digest: DigestConfig::default(),
            state_dir: default_state_dir(),
        }
    }
}

impl WatchConfig {
    /// Load from a TOML file. A missing file yields the defaults; a malformed
    /// file is an error. Secrets (API key, SMTP credentials) come from the
    /// environment, never from this file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => {
                debug!(path = %path.display(), "config file missing; using defaults");
                return Ok(Self::default());
            }
        };
        let cfg: WatchConfig = toml::from_str(&data)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(cfg)
    }
}
