use crate::input;
use crate::presenter;
use clap::Args;
use porygo_cache::{CacheManager, CacheStorage, DisabledStore};
use porygo_config::{ConfigOverrides, OutputFormat};
use porygo_core::Payload;
use porygo_fetch::{CancellationToken, Extractor, FetchResult, HttpFetcher, Orchestrator};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;

/// Flags of the root fetch command. Unset flags leave the configuration alone.
#[derive(Args, Debug, Default)]
pub struct ScrapeArgs {
    /// URLs to fetch; more are read line by line from stdin when it is piped
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Number of concurrent workers
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Deadline for each request attempt (e.g. 10s, 500ms)
    #[arg(short = 't', long, value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Attempts per URL, including the first
    #[arg(short = 'r', long)]
    pub retry: Option<usize>,

    /// Base delay of the exponential backoff between attempts
    #[arg(short = 'b', long, value_parser = parse_duration_arg)]
    pub backoff: Option<Duration>,

    /// Disable randomised backoff
    #[arg(long)]
    pub no_jitter: bool,

    /// Ignore the cache and fetch fresh data
    #[arg(short = 'f', long)]
    pub force: bool,

    /// CSS selector to extract; `selector@attr` extracts an attribute (repeatable)
    #[arg(short = 's', long = "select", value_name = "SELECTOR")]
    pub select: Vec<String>,

    /// Regex pattern to match (repeatable)
    #[arg(short = 'p', long = "pattern", value_name = "REGEX")]
    pub pattern: Vec<String>,

    /// Output format (json or text)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Only print the extracted data
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl ScrapeArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            concurrency: self.concurrency,
            timeout: self.timeout,
            retry: self.retry,
            base_delay: self.backoff,
            jitter: self.no_jitter.then_some(false),
            force: self.force.then_some(true),
            format: self.format,
            quiet: self.quiet.then_some(true),
            select: self.select.clone(),
            pattern: self.pattern.clone(),
        }
    }
}

/// The managed store, or a [`DisabledStore`] when it cannot be opened
fn open_cache(manager: &CacheManager) -> Arc<dyn CacheStorage> {
    match manager.get_or_create() {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(
                path = %manager.path().display(),
                error = %e,
                "cache unavailable, fetching without it"
            );
            Arc::new(DisabledStore)
        }
    }
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    porygo_utils::parse_duration(s).map_err(|e| e.to_string())
}

pub async fn execute(args: ScrapeArgs, config_path: Option<&Path>) -> eyre::Result<()> {
    let mut config = super::load_config(config_path)?;
    config.apply(args.overrides());
    config.validate()?;
    tracing::info!(?config, "fetching with configuration");

    let urls = input::collect_urls(args.urls)?;
    if urls.is_empty() {
        tracing::info!("no URLs provided via stdin or arguments, nothing to do");
        return Ok(());
    }

    let manager = CacheManager::with_default_path();
    let store = open_cache(&manager);
    let extractor = Arc::new(Extractor::new(
        &config.selectors.select,
        &config.selectors.pattern,
    ));
    let orchestrator = Orchestrator::new(
        Arc::new(HttpFetcher::new()?),
        store,
        config.fetch_settings(),
    )
    .with_extractor(Arc::clone(&extractor));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, letting in-flight requests finish");
                cancel.cancel();
            }
        }
    });

    let presenter = presenter::for_config(&config);
    let mut results = orchestrator.fetch_all(urls, cancel)?;

    let (mut succeeded, mut failed) = (0usize, 0usize);
    while let Some(FetchResult { key, result }) = results.next().await {
        match result {
            Ok(payload) => {
                let data = match payload {
                    Payload::Extracted(data) => data,
                    raw => extractor.scrape(&key, &raw),
                };
                let mut stdout = io::stdout().lock();
                presenter.write(&mut stdout, &data)?;
                stdout.flush()?;
                succeeded += 1;
            }
            Err(e) => {
                failed += 1;
                tracing::error!(key = %key, error = %e, "failed to fetch");
                eprintln!("{key}: {e}");
            }
        }
    }

    manager.close()?;
    tracing::info!(succeeded, failed, "finished");
    Ok(())
}
