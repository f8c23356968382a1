//! ntfy sink: plain-text digest published to a topic.

use async_trait::async_trait;
use tracing::info;
use wiki_scraper::Match;

use crate::render::{render_digest, DigestOptions};
use crate::{check_status, http_client, NotificationSink, SinkError};

pub const NTFY_SERVER: &str = "https://ntfy.sh";

const SINK: &str = "ntfy";

pub struct NtfySink {
    client:  reqwest::Client,
    server:  String,
    topic:   String,
    options: DigestOptions,
}

impl NtfySink {
    pub fn new(
        server: impl Into<String>,
        topic: impl Into<String>,
        options: DigestOptions,
    ) -> Result<Self, SinkError> {
        Ok(Self {
            client: http_client(SINK)?,
            server: server.into(),
            topic: topic.into(),
            options,
        })
    }

    fn topic_url(&self) -> String {
        format!("{}/{}", self.server.trim_end_matches('/'), self.topic)
    }
}

#[async_trait]
impl NotificationSink for NtfySink {
    fn name(&self) -> &'static str {
        SINK
    }

    async fn deliver(&self, matches: &[Match]) -> Result<(), SinkError> {
        let digest = render_digest(matches, &self.options);

        let mut request = self
            .client
            .post(self.topic_url())
            .header("Title", digest.title.as_str())
            .header("Tags", "video_game")
            .body(digest.to_plain_text());
        if let Some(icon) = &digest.thumbnail {
            request = request.header("Icon", icon.as_str());
        }

        let resp = request
            .send()
            .await
            .map_err(|source| SinkError::Request { sink: SINK, source })?;
        check_status(SINK, resp).await?;

        info!("NTFY sent to {}: {} matches", self.topic, matches.len());
        Ok(())
    }
}
