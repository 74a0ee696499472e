// src/scan.rs
// Per-source state machine and the one-cycle orchestrator.
//
// Per source: fingerprint the rendered text, then
//   - never scanned      -> extract once, persist, no notifications;
//   - fingerprint equal  -> nothing (no extraction call, no store write);
//   - fingerprint differs-> extract, diff, persist the full replacement list,
//                           then route the diff to the batch.
// Routing happens strictly after a successful persist, so a persistence
// failure can never end in a notification for state that was never saved
// (at-most-once delivery across a crash between persist and dispatch).

use std::sync::Arc;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::diff::diff_new;
use crate::error::Result;
use crate::extract::TitleExtractor;
use crate::fingerprint::fingerprint;
use crate::notify::email::{DigestDispatcher, DispatchStats};
use crate::notify::NewItemsBatch;
use crate::render::PageRenderer;
use crate::store::{RecipientStore, SourceStore};
use crate::types::{Audience, Recipient, Source};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scan_sources_total", "Sources attempted across all cycles.");
        describe_counter!("scan_changed_total", "Sources whose content fingerprint changed.");
        describe_counter!("scan_failures_total", "Sources skipped due to render/extract/persist failure.");
        describe_counter!("digest_sent_total", "Digest messages handed to the transport.");
        describe_counter!("digest_failed_total", "Digest messages the transport rejected.");
    });
}

/// What one successful source scan amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// First observation: items stored as history, nobody notified.
    Initialized,
    /// Fingerprint matched; extraction skipped entirely.
    Unchanged,
    /// Fingerprint differed; stored list replaced.
    Changed { new_titles: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub initialized: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub failed: usize,
    pub digests_sent: usize,
    pub digests_failed: usize,
}

/// The cycle orchestrator: owns the collaborator handles and the per-cycle
/// batch, processes sources sequentially, dispatches once at the end.
pub struct Watcher {
    renderer: Arc<dyn PageRenderer>,
    extractor: TitleExtractor,
    sources: Arc<dyn SourceStore>,
    recipients: Arc<dyn RecipientStore>,
    dispatcher: DigestDispatcher,
}

impl Watcher {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        extractor: TitleExtractor,
        sources: Arc<dyn SourceStore>,
        recipients: Arc<dyn RecipientStore>,
        dispatcher: DigestDispatcher,
    ) -> Self {
        Self {
            renderer,
            extractor,
            sources,
            recipients,
            dispatcher,
        }
    }

    /// Run one full scan cycle. A failing source is logged and skipped; the
    /// cycle always runs to completion across all sources, and a partial
    /// result (some sources updated, some digests sent) is a valid ending
    /// state. Only a store that cannot even list sources or recipients aborts
    /// the cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        ensure_metrics_described();

        let sources = self.sources.load_sources().await?;
        let all_recipients = self.recipients.load_recipients().await?;
        info!(
            sources = sources.len(),
            recipients = all_recipients.len(),
            "starting scan cycle"
        );

        let mut batch = NewItemsBatch::new();
        let mut report = CycleReport::default();

        for source in &sources {
            counter!("scan_sources_total").increment(1);
            match self.scan_source(source, &all_recipients, &mut batch).await {
                Ok(ScanOutcome::Initialized) => report.initialized += 1,
                Ok(ScanOutcome::Unchanged) => report.unchanged += 1,
                Ok(ScanOutcome::Changed { new_titles }) => {
                    counter!("scan_changed_total").increment(1);
                    info!(source = %source.name, new_titles, "source changed");
                    report.changed += 1;
                }
                Err(e) => {
                    counter!("scan_failures_total").increment(1);
                    warn!(source = %source.name, error = %e, "scan failed; skipping source this cycle");
                    report.failed += 1;
                }
            }
        }

        let DispatchStats { sent, failed } = self.dispatcher.dispatch_all(batch).await;
        report.digests_sent = sent;
        report.digests_failed = failed;
        Ok(report)
    }

    async fn scan_source(
        &self,
        source: &Source,
        all_recipients: &[Recipient],
        batch: &mut NewItemsBatch,
    ) -> Result<ScanOutcome> {
        let text = self.renderer.render(&source.url).await?;
        let observed = fingerprint(&text);

        if source.fingerprint.is_none() {
            // First observation: the whole list is history, not news.
            let titles = self.extractor.extract(&text).await?;
            self.sources
                .save_scan(&source.name, &observed, &titles)
                .await?;
            info!(source = %source.name, titles = titles.len(), "first scan recorded");
            return Ok(ScanOutcome::Initialized);
        }

        if source.fingerprint == observed {
            debug!(source = %source.name, "fingerprint unchanged");
            return Ok(ScanOutcome::Unchanged);
        }

        let titles = self.extractor.extract(&text).await?;
        let new_titles = diff_new(&source.known_titles, &titles);
        // Full replacement: a title that vanished and returns counts as new
        // again on its next appearance.
        self.sources
            .save_scan(&source.name, &observed, &titles)
            .await?;

        if !new_titles.is_empty() {
            let audience = resolve_audience(source, all_recipients);
            batch.record(&audience, &new_titles, &source.name, &source.url);
        }

        Ok(ScanOutcome::Changed {
            new_titles: new_titles.len(),
        })
    }
}

/// Recipients a changed source notifies: everyone for Broadcast, the
/// registered subset of the subscriber list for Restricted. Subscriber
/// addresses with no recipient record are dropped; there is nobody to greet.
fn resolve_audience(source: &Source, all_recipients: &[Recipient]) -> Vec<Recipient> {
    match &source.audience {
        Audience::Broadcast => all_recipients.to_vec(),
        Audience::Restricted(subscribers) => all_recipients
            .iter()
            .filter(|r| subscribers.contains(&r.address))
            .cloned()
            .collect(),
    }
}
