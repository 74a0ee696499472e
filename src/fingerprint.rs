// src/fingerprint.rs
// Content fingerprinting: a cheap equality gate in front of the completion
// service. SHA-256 over the exact rendered text, hex-encoded.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex digest of a source's rendered text. The empty string is the sentinel
/// for "never scanned", mirroring the stored default on a fresh source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The never-scanned sentinel.
    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::none()
    }
}

/// Deterministic digest of `text`. Total over any input, including empty.
pub fn fingerprint(text: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    Fingerprint(format!("{:x}", hasher.finalize()))
}
