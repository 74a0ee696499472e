// src/notify/mod.rs
pub mod digest;
pub mod email;

use indexmap::IndexMap;

use crate::types::Recipient;

/// Titles one source contributed for one recipient this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItems {
    pub url: String,
    pub titles: Vec<String>,
}

/// Everything one recipient gets told about this cycle, keyed by source name
/// in the order sources were processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientDigest {
    pub name: String,
    pub sources: IndexMap<String, SourceItems>,
}

/// Newly discovered titles accumulated across all sources of one cycle,
/// grouped by recipient address. Owned by the cycle orchestrator, passed by
/// mutable reference into each source step, drained by the dispatcher, and
/// gone when the cycle ends. Never persisted.
#[derive(Debug, Default)]
pub struct NewItemsBatch {
    recipients: IndexMap<String, RecipientDigest>,
}

impl NewItemsBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `new_titles` from `source_name` for every recipient in
    /// `recipients`. A call with no titles records nothing, which keeps the
    /// invariant that a recipient appears only with at least one item.
    ///
    /// Calling twice for the same source appends twice; the state machine
    /// routes each changed source exactly once per cycle.
    pub fn record(
        &mut self,
        recipients: &[Recipient],
        new_titles: &[String],
        source_name: &str,
        source_url: &str,
    ) {
        if new_titles.is_empty() {
            return;
        }
        for recipient in recipients {
            let entry = self
                .recipients
                .entry(recipient.address.clone())
                .or_insert_with(|| RecipientDigest {
                    name: recipient.name.clone(),
                    sources: IndexMap::new(),
                });
            let per_source = entry
                .sources
                .entry(source_name.to_string())
                .or_insert_with(|| SourceItems {
                    url: source_url.to_string(),
                    titles: Vec::new(),
                });
            per_source.titles.extend(new_titles.iter().cloned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RecipientDigest)> {
        self.recipients.iter()
    }

    pub fn get(&self, address: &str) -> Option<&RecipientDigest> {
        self.recipients.get(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn groups_by_recipient_then_source_in_order() {
        let ada = Recipient::new("ada@x.test", "Ada");
        let bob = Recipient::new("bob@x.test", "Bob");
        let mut batch = NewItemsBatch::new();

        batch.record(
            &[ada.clone(), bob.clone()],
            &v(&["Rust Engineer"]),
            "Cypress",
            "https://cypress.test",
        );
        batch.record(&[ada.clone()], &v(&["QA Lead"]), "Acme", "https://acme.test");

        assert_eq!(batch.recipient_count(), 2);
        let ada_digest = batch.get("ada@x.test").unwrap();
        assert_eq!(ada_digest.name, "Ada");
        let sources: Vec<_> = ada_digest.sources.keys().cloned().collect();
        assert_eq!(sources, vec!["Cypress", "Acme"]);
        assert_eq!(ada_digest.sources["Acme"].titles, v(&["QA Lead"]));

        let bob_digest = batch.get("bob@x.test").unwrap();
        assert_eq!(bob_digest.sources.len(), 1);
    }

    #[test]
    fn empty_titles_record_nothing() {
        let mut batch = NewItemsBatch::new();
        batch.record(
            &[Recipient::new("ada@x.test", "Ada")],
            &[],
            "Cypress",
            "https://cypress.test",
        );
        assert!(batch.is_empty());
    }

    #[test]
    fn same_source_appends_in_order() {
        let ada = Recipient::new("ada@x.test", "Ada");
        let mut batch = NewItemsBatch::new();
        batch.record(&[ada.clone()], &v(&["A", "A"]), "Cypress", "https://c.test");
        batch.record(&[ada], &v(&["B"]), "Cypress", "https://c.test");
        assert_eq!(
            batch.get("ada@x.test").unwrap().sources["Cypress"].titles,
            v(&["A", "A", "B"])
        );
    }

    #[test]
    fn no_recipients_means_no_entries() {
        let mut batch = NewItemsBatch::new();
        batch.record(&[], &v(&["A"]), "Cypress", "https://c.test");
        assert!(batch.is_empty());
    }
}
