//! Source registry: which wiki fragments to poll and what to watch in them.
//!
//! JSON shape (one object per entry):
//! {
//!   "game": "Valorant",
//!   "endpoint": "https://liquipedia.net/valorant/api.php?action=parse&...",
//!   "format": "parse_api",                 // or "raw_html"
//!   "schema": "main-page-matches/v1",      // or "team-infobox/v1"
//!   "watch": ["KC", "KCBS"],               // or a single "KC"
//!   "comparison": "substring",             // or "exact"
//!   "temporal": "today_only"               // or "any"
//! }

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wiki_scraper::schema::{builtin_spec, MAIN_PAGE_MATCHES, TEAM_INFOBOX};
use wiki_scraper::{EndpointFormat, BASE_URL};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Watch {
    Team(String),
    List(Vec<String>),
}

impl Watch {
    pub fn teams(&self) -> &[String] {
        match self {
            Watch::Team(team) => std::slice::from_ref(team),
            Watch::List(list) => list,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPolicy {
    #[default]
    Exact,
    /// Watched name anywhere inside the team name ("KC" hits "KCB")
    Substring,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalPolicy {
    #[default]
    TodayOnly,
    Any,
}

fn default_schema() -> String {
    MAIN_PAGE_MATCHES.version.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub game:       String,
    pub endpoint:   String,
    #[serde(default)]
    pub format:     EndpointFormat,
    #[serde(default = "default_schema")]
    pub schema:     String,
    pub watch:      Watch,
    #[serde(default)]
    pub comparison: ComparisonPolicy,
    #[serde(default)]
    pub temporal:   TemporalPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry has no entries")]
    Empty,

    #[error("entry #{index} has no game label")]
    MissingGame { index: usize },

    #[error("{game}: invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { game: String, endpoint: String, reason: String },

    #[error("{game}: watch list is empty or contains a blank name")]
    EmptyWatch { game: String },

    #[error("{game}: unknown markup schema `{schema}`")]
    UnknownSchema { game: String, schema: String },

    #[error("cannot read registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse registry {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Validated, ordered list of registry entries.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    entries: Vec<RegistryEntry>,
}

impl SourceRegistry {
    pub fn new(entries: Vec<RegistryEntry>) -> Result<Self, RegistryError> {
        if entries.is_empty() {
            return Err(RegistryError::Empty);
        }
        for (index, entry) in entries.iter().enumerate() {
            validate_entry(index, entry)?;
        }
        Ok(Self { entries })
    }

    pub fn from_json(raw: &str) -> Result<Self, RegistryError> {
        Self::parse(raw, "<inline>")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, &path.display().to_string())
    }

    fn parse(raw: &str, origin: &str) -> Result<Self, RegistryError> {
        let entries: Vec<RegistryEntry> = serde_json::from_str(raw).map_err(|source| RegistryError::Json {
            origin: origin.to_string(),
            source,
        })?;
        Self::new(entries)
    }

    /// Karmine Corp rosters across the wikis the bot has always followed.
    pub fn builtin() -> Result<Self, RegistryError> {
        let kc = || Watch::List(vec!["KC".to_string(), "Karmine Corp".to_string()]);
        let main_page = |game: &str, wiki: &str, tiers: &str| -> Result<RegistryEntry, RegistryError> {
            Ok(RegistryEntry {
                game:       game.to_string(),
                endpoint:   main_page_endpoint(wiki, tiers, "Europe").map_err(|reason| {
                    RegistryError::InvalidEndpoint {
                        game:     game.to_string(),
                        endpoint: wiki.to_string(),
                        reason,
                    }
                })?,
                format:     EndpointFormat::ParseApi,
                schema:     MAIN_PAGE_MATCHES.version.to_string(),
                watch:      kc(),
                comparison: ComparisonPolicy::Substring,
                temporal:   TemporalPolicy::TodayOnly,
            })
        };

        Self::new(vec![
            main_page("League of Legends", "leagueoflegends", "1")?,
            main_page("League of Legends", "leagueoflegends", "3")?,
            main_page("Valorant", "valorant", "1,2")?,
            main_page("Rocket League", "rocketleague", "1,2")?,
            RegistryEntry {
                game:       "TFT".to_string(),
                endpoint:   team_page_endpoint("tft", "Karmine_Corp"),
                format:     EndpointFormat::RawHtml,
                schema:     TEAM_INFOBOX.version.to_string(),
                watch:      Watch::Team("KC".to_string()),
                comparison: ComparisonPolicy::Exact,
                temporal:   TemporalPolicy::TodayOnly,
            },
        ])
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_entry(index: usize, entry: &RegistryEntry) -> Result<(), RegistryError> {
    if entry.game.trim().is_empty() {
        return Err(RegistryError::MissingGame { index });
    }

    let invalid = |reason: String| RegistryError::InvalidEndpoint {
        game:     entry.game.clone(),
        endpoint: entry.endpoint.clone(),
        reason,
    };
    let url = Url::parse(&entry.endpoint).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }

    let teams = entry.watch.teams();
    if teams.is_empty() || teams.iter().any(|t| t.trim().is_empty()) {
        return Err(RegistryError::EmptyWatch { game: entry.game.clone() });
    }

    if builtin_spec(&entry.schema).is_none() {
        return Err(RegistryError::UnknownSchema {
            game:   entry.game.clone(),
            schema: entry.schema.clone(),
        });
    }

    Ok(())
}

/// `MainPageMatches/Upcoming` through the parse API, filtered by tier and region.
pub fn main_page_endpoint(wiki: &str, tiers: &str, region: &str) -> Result<String, String> {
    let text = format!(
        "{{{{MainPageMatches/Upcoming|filterbuttons-liquipediatier={tiers}|filterbuttons-region={region}}}}}"
    );
    let url = Url::parse_with_params(
        &format!("{BASE_URL}/{wiki}/api.php"),
        &[
            ("action", "parse"),
            ("format", "json"),
            ("contentmodel", "wikitext"),
            ("maxage", "600"),
            ("smaxage", "600"),
            ("disablelimitreport", "true"),
            ("uselang", "content"),
            ("prop", "text"),
            ("text", text.as_str()),
        ],
    )
    .map_err(|e| e.to_string())?;
    Ok(url.to_string())
}

pub fn team_page_endpoint(wiki: &str, page: &str) -> String {
    format!("{BASE_URL}/{wiki}/{page}")
}
