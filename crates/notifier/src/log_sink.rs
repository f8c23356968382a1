//! Dry-run sink.

use async_trait::async_trait;
use tracing::info;
use wiki_scraper::Match;

use crate::render::{render_digest, DigestOptions};
use crate::{NotificationSink, SinkError};

#[derive(Debug, Default)]
pub struct LogSink {
    options: DigestOptions,
}

impl LogSink {
    pub fn new(options: DigestOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, matches: &[Match]) -> Result<(), SinkError> {
        let digest = render_digest(matches, &self.options);
        info!("{}\n{}", digest.title, digest.to_plain_text());
        Ok(())
    }
}
