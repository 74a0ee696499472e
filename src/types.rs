// src/types.rs
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

/// Who gets notified when a source grows new postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "subscribers", rename_all = "snake_case")]
pub enum Audience {
    /// Every registered recipient.
    Broadcast,
    /// Only the listed recipient addresses.
    Restricted(BTreeSet<String>),
}

impl Default for Audience {
    fn default() -> Self {
        Self::Broadcast
    }
}

/// One monitored career page with its change-tracking state.
///
/// `known_titles` always reflects the full title list produced by the most
/// recent scan whose fingerprint changed (or the first scan). It is replaced
/// wholesale, never merged: a title that disappears and later reappears counts
/// as new again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub fingerprint: Fingerprint,
    #[serde(default)]
    pub known_titles: Vec<String>,
    #[serde(default)]
    pub audience: Audience,
    /// When the last successful scan of this source was persisted.
    #[serde(default)]
    pub last_scanned_at: Option<DateTime<Utc>>,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            fingerprint: Fingerprint::none(),
            known_titles: Vec::new(),
            audience: Audience::Broadcast,
            last_scanned_at: None,
        }
    }

    pub fn restricted_to<I, S>(mut self, subscribers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = Audience::Restricted(subscribers.into_iter().map(Into::into).collect());
        self
    }
}

/// An addressable digest recipient. Created and removed externally; read-only
/// to the scan pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    pub name: String,
}

impl Recipient {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_roundtrips_through_json() {
        let restricted = Audience::Restricted(["a@x.test".to_string()].into_iter().collect());
        let json = serde_json::to_string(&restricted).unwrap();
        assert_eq!(serde_json::from_str::<Audience>(&json).unwrap(), restricted);

        let json = serde_json::to_string(&Audience::Broadcast).unwrap();
        assert_eq!(
            serde_json::from_str::<Audience>(&json).unwrap(),
            Audience::Broadcast
        );
    }

    #[test]
    fn fresh_source_has_sentinel_fingerprint() {
        let s = Source::new("Cypress", "https://cypress.test/careers");
        assert!(s.fingerprint.is_none());
        assert!(s.known_titles.is_empty());
        assert_eq!(s.audience, Audience::Broadcast);
    }
}
