//! Digest rendering. No I/O; every sink starts from the same [`Digest`].

use chrono::{Local, TimeZone};
use serde::Serialize;
use std::fmt::Display;
use wiki_scraper::Match;

pub const DEFAULT_TITLE: &str = "Today's matches";
pub const EMPTY_DESCRIPTION: &str = "No matches found for today.";
pub const UNKNOWN_TIME: &str = "Unknown time";

/// Discord refuses embeds with more fields than this.
pub const MAX_FIELDS: usize = 25;
/// Discord's cap on the summed characters of title, description, fields and footer.
pub const MAX_EMBED_CHARS: usize = 6000;
pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_FIELD_VALUE_CHARS: usize = 1024;

/// Kept free for the overflow footer.
const FOOTER_RESERVE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestOptions {
    pub title:     String,
    pub thumbnail: Option<String>,
}

impl Default for DigestOptions {
    fn default() -> Self {
        Self { title: DEFAULT_TITLE.to_string(), thumbnail: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestField {
    pub name:  String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub title:       String,
    pub thumbnail:   Option<String>,
    pub description: Option<String>,
    pub fields:      Vec<DigestField>,
    /// Set when matches were cut to fit [`MAX_FIELDS`] or [`MAX_EMBED_CHARS`]
    pub footer:      Option<String>,
}

impl Digest {
    /// Same content without Discord emoji shortcodes, one block per match.
    pub fn to_plain_text(&self) -> String {
        let mut blocks = Vec::with_capacity(self.fields.len() + 2);
        if let Some(description) = &self.description {
            blocks.push(description.clone());
        }
        for field in &self.fields {
            let lines: Vec<&str> = std::iter::once(field.name.as_str())
                .chain(field.value.lines())
                .map(strip_shortcode)
                .collect();
            blocks.push(lines.join("\n"));
        }
        if let Some(footer) = &self.footer {
            blocks.push(footer.clone());
        }
        blocks.join("\n\n")
    }
}

/// Cut to at most `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push('…');
    cut
}

/// `":trophy: LEC"` → `"LEC"`; lines without a leading shortcode are untouched.
fn strip_shortcode(line: &str) -> &str {
    line.strip_prefix(':')
        .and_then(|rest| rest.split_once(": "))
        .filter(|(code, _)| !code.is_empty() && !code.contains(char::is_whitespace))
        .map_or(line, |(_, text)| text)
}

/// Render with kickoff times in the machine's local zone.
pub fn render_digest(matches: &[Match], options: &DigestOptions) -> Digest {
    render_digest_in(matches, options, &Local)
}

pub fn render_digest_in<Tz>(matches: &[Match], options: &DigestOptions, tz: &Tz) -> Digest
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let title = truncate(&options.title, MAX_TITLE_CHARS);
    let description = matches.is_empty().then(|| EMPTY_DESCRIPTION.to_string());

    let mut budget = MAX_EMBED_CHARS - FOOTER_RESERVE - title.chars().count();
    let mut fields = Vec::new();
    for m in matches.iter().take(MAX_FIELDS) {
        let field = DigestField {
            name:  field_name(m, tz),
            value: truncate(&field_value(m), MAX_FIELD_VALUE_CHARS),
        };
        let size = field.name.chars().count() + field.value.chars().count();
        if size > budget {
            break;
        }
        budget -= size;
        fields.push(field);
    }

    let hidden = matches.len() - fields.len();
    let footer = (hidden > 0).then(|| format!("+{hidden} more matches not shown"));

    Digest {
        title,
        thumbnail: options.thumbnail.clone(),
        description,
        fields,
        footer,
    }
}

fn field_name<Tz>(m: &Match, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = m
        .date_time
        .map(|dt| dt.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_else(|| UNKNOWN_TIME.to_string());
    format!(":clock10: {time}")
}

fn field_value(m: &Match) -> String {
    let mut lines = vec![format!(":video_game: {}", m.game)];

    if !m.tournament.is_unknown() {
        lines.push(format!(":trophy: {}", m.tournament.name));
    }

    let mut versus = format!(":crossed_swords: {} vs {}", m.team_left.name, m.team_right.name);
    if let Some(format) = &m.format {
        versus.push_str(&format!(" ({format})"));
    }
    lines.push(versus);

    if let Some(link) = &m.tournament.link {
        lines.push(format!(":link: [Bracket link]({link})"));
    }

    lines.join("\n")
}
