//! matchday: Notifier
//!
//! Turns one cycle's match list into a digest and hands it to a sink.
//! - render: pure digest rendering shared by every sink
//! - discord: one embed per digest through the bot REST API
//! - ntfy: plain-text push to a topic
//! - log_sink: dry run, digest goes to the tracing output only

use async_trait::async_trait;
use std::time::Duration;
use wiki_scraper::Match;

pub mod discord;
pub mod log_sink;
pub mod ntfy;
pub mod render;

pub use discord::{DiscordSink, DISCORD_API_BASE};
pub use log_sink::LogSink;
pub use ntfy::{NtfySink, NTFY_SERVER};
pub use render::{render_digest, render_digest_in, Digest, DigestField, DigestOptions};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("{sink}: request failed: {source}")]
    Request {
        sink: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{sink}: cannot build HTTP client: {source}")]
    Client {
        sink: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{sink}: rejected with HTTP {status}: {body}")]
    Rejected {
        sink:   &'static str,
        status: reqwest::StatusCode,
        body:   String,
    },
}

/// Where a cycle's digest ends up.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver `matches` as one digest; an empty slice still produces a message.
    async fn deliver(&self, matches: &[Match]) -> Result<(), SinkError>;
}

const SINK_TIMEOUT: Duration = Duration::from_secs(10);

fn http_client(sink: &'static str) -> Result<reqwest::Client, SinkError> {
    reqwest::Client::builder()
        .timeout(SINK_TIMEOUT)
        .build()
        .map_err(|source| SinkError::Client { sink, source })
}

/// Turn a non-2xx answer into [`SinkError::Rejected`].
async fn check_status(sink: &'static str, resp: reqwest::Response) -> Result<(), SinkError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::warn!("{} delivery failed: {} {}", sink, status, body);
    Err(SinkError::Rejected { sink, status, body })
}
