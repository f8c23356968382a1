/// matchday: esports match-of-the-day digest
///
/// What it does:
///   1. Polls every Liquipedia source in the registry (parse API or team page)
///   2. Keeps matches that involve a watched team (and, per source, are today)
///   3. Drops anything already announced, sorts by kickoff
///   4. Delivers the list as one digest (Discord embed, ntfy or log)
///
/// Run once (cron):
///   cargo run --bin matchday
/// Keep polling every 15 min:
///   MATCHDAY_POLL_INTERVAL_SECS=900 cargo run --bin matchday

mod config;

use anyhow::{Context, Result};
use config::{AppConfig, SinkConfig};
use dotenv::dotenv;
use logger::{now_iso, DigestDeliveredEvent, EventLogger};
use match_watch::{MemorySeenStore, Pipeline};
use notifier::{DigestOptions, DiscordSink, LogSink, NotificationSink, NtfySink, SinkError};
use std::env;
use std::fs::File;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use wiki_scraper::{FragmentFetcher, Match};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    info!("=== matchday ===");
    info!(
        "Sources: {} | Sink: {} | Logs: {}",
        config.registry.len(),
        config.sink.name(),
        config.log_dir.display()
    );

    // Single instance lock, one per registry
    let lock_file_path = env::temp_dir().join(config.lock_file_name());
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another matchday instance holds {:?}. Exiting.", lock_file_path);
            return Ok(());
        }
    };

    let events = EventLogger::new(config.log_dir.clone());
    let sink = build_sink(&config.sink, &config.digest).context("cannot build notification sink")?;

    let pipeline = Pipeline::new(
        config.registry,
        FragmentFetcher::new(&config.fetcher).context("cannot build HTTP client")?,
        MemorySeenStore::new(config.null_date_policy),
    )
    .context("cannot compile markup schemas")?
    .with_event_log(events.clone());

    let Some(interval) = config.poll_interval else {
        let report = pipeline.run_cycle().await;
        deliver(sink.as_ref(), &report.matches, &events)
            .await
            .context("digest delivery failed")?;
        return Ok(());
    };

    info!("Poll interval: {}s", interval.as_secs());

    let mut first_cycle = true;
    loop {
        info!("--- Poll cycle ---");
        let report = pipeline.run_cycle().await;

        // later cycles only speak up when something new appeared
        if first_cycle || !report.matches.is_empty() {
            if let Err(e) = deliver(sink.as_ref(), &report.matches, &events).await {
                warn!("Digest delivery failed: {}", e);
            }
        }
        first_cycle = false;

        sleep(interval).await;
    }
}

fn build_sink(config: &SinkConfig, digest: &DigestOptions) -> Result<Box<dyn NotificationSink>, SinkError> {
    Ok(match config {
        SinkConfig::Discord { token, channel_id } => {
            Box::new(DiscordSink::new(token.as_str(), channel_id.as_str(), digest.clone())?)
        }
        SinkConfig::Ntfy { server, topic } => {
            Box::new(NtfySink::new(server.as_str(), topic.as_str(), digest.clone())?)
        }
        SinkConfig::Log => Box::new(LogSink::new(digest.clone())),
    })
}

async fn deliver(
    sink: &dyn NotificationSink,
    matches: &[Match],
    events: &EventLogger,
) -> Result<(), SinkError> {
    let result = sink.deliver(matches).await;

    let _ = events.log(&DigestDeliveredEvent {
        ts:      now_iso(),
        event:   "DIGEST_DELIVERED",
        sink:    sink.name().to_string(),
        matches: matches.len(),
        ok:      result.is_ok(),
        message: result.as_ref().err().map_or_else(|| "ok".to_string(), |e| e.to_string()),
    });

    result
}
