//! jobwatch — Binary entrypoint
//! Runs exactly one scan cycle over the registered sources and exits. Cadence
//! (cron, systemd timer, whatever) belongs to the invoker, not to this core.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jobwatch::config::WatchConfig;
use jobwatch::extract::{OpenAiClient, TitleExtractor};
use jobwatch::notify::email::{DigestDispatcher, LogOnlyMailer, MailTransport, SmtpMailer};
use jobwatch::render::HttpRenderer;
use jobwatch::scan::Watcher;
use jobwatch::store::JsonStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config_path =
        std::env::var("JOBWATCH_CONFIG").unwrap_or_else(|_| "config/watch.toml".to_string());
    let config = WatchConfig::load(&config_path).context("load config")?;

    let store = Arc::new(JsonStore::new(&config.state_dir));
    let renderer = Arc::new(HttpRenderer::new(&config.http));
    let client = Arc::new(OpenAiClient::new(&config.extraction, &config.http));
    let extractor = TitleExtractor::new(client, &config.extraction);

    let mailer: Arc<dyn MailTransport> = match SmtpMailer::from_env().context("SMTP config")? {
        Some(smtp) => Arc::new(smtp),
        None => Arc::new(LogOnlyMailer),
    };
    let dispatcher = DigestDispatcher::new(mailer, config.digest.clone());

    let watcher = Watcher::new(renderer, extractor, store.clone(), store, dispatcher);
    let report = watcher.run_cycle().await.context("scan cycle")?;
    info!(?report, "scan cycle finished");
    Ok(())
}
