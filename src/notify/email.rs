// src/notify/email.rs
use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use metrics::counter;
use tracing::{info, warn};

use super::digest::render_digest;
use super::NewItemsBatch;
use crate::config::DigestConfig;
use crate::error::{Result, WatchError};

/// Outbound message seam. One send attempt per call; retry policy, if any,
/// belongs to the transport behind it.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// SMTP transport over lettre. Configured entirely from the environment:
/// SMTP_HOST, SMTP_USER, SMTP_PASS, NOTIFY_EMAIL_FROM.
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// `Ok(None)` when SMTP_HOST is unset, so callers can fall back to the
    /// log-only mailer instead of failing startup.
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        let Ok(host) = std::env::var("SMTP_HOST") else {
            return Ok(None);
        };
        let user = std::env::var("SMTP_USER").context("SMTP_USER missing")?;
        let pass = std::env::var("SMTP_PASS").context("SMTP_PASS missing")?;
        let from_addr = std::env::var("NOTIFY_EMAIL_FROM").context("NOTIFY_EMAIL_FROM missing")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();
        let from = from_addr.parse().context("invalid NOTIFY_EMAIL_FROM")?;

        Ok(Some(Self { mailer, from }))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| WatchError::dispatch(to, format!("invalid address: {e}")))?;
        let msg = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| WatchError::dispatch(to, format!("build email: {e}")))?;

        self.mailer
            .send(msg)
            .await
            .map_err(|e| WatchError::dispatch(to, e))?;
        Ok(())
    }
}

/// Logs instead of sending. Used when SMTP is not configured.
pub struct LogOnlyMailer;

#[async_trait]
impl MailTransport for LogOnlyMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        info!(%to, %subject, "mail transport disabled (no SMTP_HOST); digest not sent");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub sent: usize,
    pub failed: usize,
}

/// Drains a cycle's batch into one message per recipient. A failed send is
/// logged and counted, never retried this cycle, and never touches source
/// state.
pub struct DigestDispatcher {
    transport: std::sync::Arc<dyn MailTransport>,
    digest_cfg: DigestConfig,
}

impl DigestDispatcher {
    pub fn new(transport: std::sync::Arc<dyn MailTransport>, digest_cfg: DigestConfig) -> Self {
        Self {
            transport,
            digest_cfg,
        }
    }

    pub async fn dispatch_all(&self, batch: NewItemsBatch) -> DispatchStats {
        let mut stats = DispatchStats::default();
        for (address, digest) in batch.iter() {
            let body = render_digest(digest, &self.digest_cfg.signoff);
            match self
                .transport
                .send(address, &self.digest_cfg.subject, &body)
                .await
            {
                Ok(()) => {
                    counter!("digest_sent_total").increment(1);
                    info!(recipient = %digest.name, %address, "digest sent");
                    stats.sent += 1;
                }
                Err(e) => {
                    counter!("digest_failed_total").increment(1);
                    warn!(%address, error = %e, "digest send failed");
                    stats.failed += 1;
                }
            }
        }
        stats
    }
}
