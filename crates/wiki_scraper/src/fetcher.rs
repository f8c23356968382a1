//! Fragment fetcher: one GET per registry endpoint.
//!
//! MediaWiki `action=parse` answers with
//! `{ "parse": { "title": "API", "text": { "*": "<div class=\"mw-parser-output\">..." } } }`
//! and, on API-level failures, with HTTP 200 and `{ "error": { "code", "info" } }`.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "matchday/0.1 (esports schedule digest bot)";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointFormat {
    /// JSON envelope from `api.php?action=parse`
    #[default]
    ParseApi,
    /// Plain wiki page, body is the fragment
    RawHtml,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout:              Duration,
    /// Spacing between requests; zero disables the limiter
    pub min_request_interval: Duration,
    pub user_agent:           String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout:              Duration::from_secs(10),
            min_request_interval: Duration::from_secs(2), // Liquipedia parse API: 1 req / 2s
            user_agent:           DEFAULT_USER_AGENT.to_string(),
        }
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ParseEnvelope {
    parse: Option<ParseBody>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ParseBody {
    text: Option<ParseText>,
}

#[derive(Debug, Deserialize)]
struct ParseText {
    #[serde(rename = "*")]
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    info: Option<String>,
}

/// Pull `parse.text["*"]` out of a parse-API body.
pub fn unwrap_envelope(url: &str, body: &str) -> Result<String, FetchError> {
    let invalid = |reason: String| FetchError::InvalidResponse { url: url.to_string(), reason };

    let envelope: ParseEnvelope =
        serde_json::from_str(body).map_err(|e| invalid(format!("not a parse envelope: {e}")))?;

    if let Some(err) = envelope.error {
        return Err(invalid(format!(
            "api error {}: {}",
            err.code.as_deref().unwrap_or("?"),
            err.info.as_deref().unwrap_or("")
        )));
    }

    let parse = envelope.parse.ok_or_else(|| invalid("missing `parse`".to_string()))?;
    let text = parse.text.ok_or_else(|| invalid("missing `parse.text`".to_string()))?;
    match text.html {
        Some(html) if !html.is_empty() => Ok(html),
        _ => Err(invalid("missing `parse.text[\"*\"]`".to_string())),
    }
}

// ── Fetcher ───────────────────────────────────────────────────────────────────

pub struct FragmentFetcher {
    client:  reqwest::Client,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl FragmentFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let limiter = Quota::with_period(config.min_request_interval).map(RateLimiter::direct);

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, limiter })
    }

    /// GET `url` and return the markup fragment it carries.
    pub async fn fetch(&self, url: &str, format: EndpointFormat) -> Result<String, FetchError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let network = |source| FetchError::Network { url: url.to_string(), source };

        let resp = self.client.get(url).send().await.map_err(network)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status });
        }

        let body = resp.text().await.map_err(network)?;
        debug!("fetched {} bytes from {}", body.len(), url);

        match format {
            EndpointFormat::ParseApi => unwrap_envelope(url, &body),
            EndpointFormat::RawHtml => Ok(body),
        }
    }
}
