//! Discord bot sink: `POST /channels/{id}/messages` with a single embed.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use wiki_scraper::Match;

use crate::render::{render_digest, Digest, DigestOptions};
use crate::{check_status, http_client, NotificationSink, SinkError};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// `#0099ff`
const EMBED_COLOR: u32 = 0x0099ff;

const SINK: &str = "discord";

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    embeds: [Embed<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<EmbedUrl<'a>>,
    fields: Vec<EmbedField<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<EmbedFooter<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct EmbedField<'a> {
    name:   &'a str,
    value:  &'a str,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct EmbedFooter<'a> {
    text: &'a str,
}

impl<'a> From<&'a Digest> for MessagePayload<'a> {
    fn from(digest: &'a Digest) -> Self {
        let embed = Embed {
            title:       &digest.title,
            color:       EMBED_COLOR,
            description: digest.description.as_deref(),
            thumbnail:   digest.thumbnail.as_deref().map(|url| EmbedUrl { url }),
            fields:      digest
                .fields
                .iter()
                .map(|f| EmbedField { name: &f.name, value: &f.value, inline: false })
                .collect(),
            footer:      digest.footer.as_deref().map(|text| EmbedFooter { text }),
        };
        Self { embeds: [embed] }
    }
}

pub struct DiscordSink {
    client:     reqwest::Client,
    api_base:   String,
    token:      String,
    channel_id: String,
    options:    DigestOptions,
}

impl DiscordSink {
    pub fn new(
        token: impl Into<String>,
        channel_id: impl Into<String>,
        options: DigestOptions,
    ) -> Result<Self, SinkError> {
        Ok(Self {
            client:     http_client(SINK)?,
            api_base:   DISCORD_API_BASE.to_string(),
            token:      token.into(),
            channel_id: channel_id.into(),
            options,
        })
    }

    /// Point at another API root (mock servers, proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/channels/{}/messages", self.api_base.trim_end_matches('/'), self.channel_id)
    }
}

#[async_trait]
impl NotificationSink for DiscordSink {
    fn name(&self) -> &'static str {
        SINK
    }

    async fn deliver(&self, matches: &[Match]) -> Result<(), SinkError> {
        let digest = render_digest(matches, &self.options);
        let payload = MessagePayload::from(&digest);

        let resp = self
            .client
            .post(self.messages_url())
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .json(&payload)
            .send()
            .await
            .map_err(|source| SinkError::Request { sink: SINK, source })?;
        check_status(SINK, resp).await?;

        info!("Discord digest sent to channel {}: {} matches", self.channel_id, matches.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DigestField, EMPTY_DESCRIPTION};

    #[test]
    fn payload_skips_absent_parts() {
        let digest = Digest {
            title:       "Today's matches".to_string(),
            thumbnail:   None,
            description: Some(EMPTY_DESCRIPTION.to_string()),
            fields:      vec![],
            footer:      None,
        };
        let json = serde_json::to_value(MessagePayload::from(&digest)).unwrap();
        let embed = &json["embeds"][0];

        assert_eq!(embed["color"], 39423);
        assert_eq!(embed["description"], EMPTY_DESCRIPTION);
        assert!(embed.get("thumbnail").is_none());
        assert!(embed.get("footer").is_none());
    }

    #[test]
    fn payload_carries_fields_thumbnail_and_footer() {
        let digest = Digest {
            title:       "Récap".to_string(),
            thumbnail:   Some("https://example.org/kc.png".to_string()),
            description: None,
            fields:      vec![DigestField { name: ":clock10: 17:00".into(), value: "x".into() }],
            footer:      Some("+1 more matches not shown".to_string()),
        };
        let json = serde_json::to_value(MessagePayload::from(&digest)).unwrap();
        let embed = &json["embeds"][0];

        assert_eq!(embed["thumbnail"]["url"], "https://example.org/kc.png");
        assert_eq!(embed["fields"][0]["name"], ":clock10: 17:00");
        assert_eq!(embed["fields"][0]["inline"], false);
        assert_eq!(embed["footer"]["text"], "+1 more matches not shown");
        assert!(embed.get("description").is_none());
    }

    #[test]
    fn trailing_slash_in_base_is_tolerated() {
        let sink = DiscordSink::new("t", "123", DigestOptions::default())
            .unwrap()
            .with_api_base("http://localhost:1/api/");
        assert_eq!(sink.messages_url(), "http://localhost:1/api/channels/123/messages");
    }
}
