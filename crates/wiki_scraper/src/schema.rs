//! Markup schema adapters.
//!
//! Liquipedia renders match lists through templates it versions on its own.
//! Every selector the extractor depends on lives in one [`SelectorSpec`], so a
//! template change means a new spec, not a change to filtering or dedup.
//!
//! MainPageMatches/Upcoming (one block per match):
//! <div class="match">
//!   <div class="team-left">  <span class="team-template-text"><a>KC</a></span> ... </div>
//!   <div class="versus-lower"><abbr title="Best of 3">Bo3</abbr></div>
//!   <div class="team-right"> ... </div>
//!   <span class="timer-object" data-timestamp="1741971600"></span>
//!   <div class="tournament-text"><a href="/leagueoflegends/LEC/2025">LEC</a></div>
//! </div>

use chrono::{DateTime, Utc};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::model::{Match, Team, Tournament, UNKNOWN_TEAM, UNKNOWN_TOURNAMENT};
use crate::BASE_URL;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("unknown markup schema `{0}`")]
    Unknown(String),
}

/// Turns one markup fragment into candidate matches, in document order.
pub trait MarkupSchema: Send + Sync {
    fn version(&self) -> &str;

    fn extract(&self, html: &str, game: &str) -> Vec<Match>;
}

/// Raw selector set for one template version.
#[derive(Debug, Clone, Copy)]
pub struct SelectorSpec {
    pub version:    &'static str,
    pub container:  &'static str,
    pub sides:      [&'static str; 2],
    pub team_name:  &'static str,
    pub team_icon:  &'static str,
    pub tournament: &'static str,
    pub timer:      &'static str,
    pub format:     &'static str,
}

pub const MAIN_PAGE_MATCHES: SelectorSpec = SelectorSpec {
    version:    "main-page-matches/v1",
    container:  ".match",
    sides:      [".team-left", ".team-right"],
    team_name:  ".team-template-text a",
    team_icon:  ".team-template-image-icon img",
    tournament: ".tournament-text a",
    timer:      ".timer-object",
    format:     ".versus-lower abbr",
};

/// Upcoming-matches infobox on a team page.
pub const TEAM_INFOBOX: SelectorSpec = SelectorSpec {
    version:    "team-infobox/v1",
    container:  ".fo-nttax-infobox.panel table.wikitable.wikitable-striped.infobox_matches_content",
    sides:      [".team-left", ".team-right"],
    team_name:  ".team-template-text a",
    team_icon:  ".team-template-image-icon img",
    tournament: ".tournament-text-flex a",
    timer:      ".timer-object",
    format:     ".versus-lower abbr",
};

pub const BUILTIN_SPECS: [SelectorSpec; 2] = [MAIN_PAGE_MATCHES, TEAM_INFOBOX];

pub fn builtin_spec(version: &str) -> Option<&'static SelectorSpec> {
    BUILTIN_SPECS.iter().find(|s| s.version == version)
}

struct SideSelectors {
    name: Selector,
    icon: Selector,
}

/// Compiled [`SelectorSpec`].
pub struct SelectorSchema {
    version:    String,
    base:       Url,
    container:  Selector,
    left:       SideSelectors,
    right:      SideSelectors,
    tournament: Selector,
    timer:      Selector,
    format:     Selector,
}

fn compile(selector: &str) -> Result<Selector, SchemaError> {
    Selector::parse(selector).map_err(|e| SchemaError::InvalidSelector {
        selector: selector.to_string(),
        reason:   e.to_string(),
    })
}

fn compile_side(spec: &SelectorSpec, side: &str) -> Result<SideSelectors, SchemaError> {
    Ok(SideSelectors {
        name: compile(&format!("{side} {}", spec.team_name))?,
        icon: compile(&format!("{side} {}", spec.team_icon))?,
    })
}

/// Trimmed text content, `None` when nothing but whitespace.
fn element_text(el: ElementRef<'_>) -> Option<String> {
    let text = el.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

impl SelectorSchema {
    pub fn compile(spec: &SelectorSpec, base_url: &str) -> Result<Self, SchemaError> {
        let base = Url::parse(base_url).map_err(|e| SchemaError::InvalidBaseUrl {
            url:    base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            version:    spec.version.to_string(),
            base,
            container:  compile(spec.container)?,
            left:       compile_side(spec, spec.sides[0])?,
            right:      compile_side(spec, spec.sides[1])?,
            tournament: compile(spec.tournament)?,
            timer:      compile(spec.timer)?,
            format:     compile(spec.format)?,
        })
    }

    /// Built-in schema by version name, resolving links against liquipedia.net.
    pub fn builtin(version: &str) -> Result<Self, SchemaError> {
        let spec = builtin_spec(version).ok_or_else(|| SchemaError::Unknown(version.to_string()))?;
        Self::compile(spec, BASE_URL)
    }

    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        self.base.join(href).ok().map(|u| u.to_string())
    }

    fn extract_team(&self, node: ElementRef<'_>, side: &SideSelectors) -> Team {
        let name = node
            .select(&side.name)
            .next()
            .and_then(element_text)
            .unwrap_or_else(|| UNKNOWN_TEAM.to_string());

        let icon = node
            .select(&side.icon)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| self.resolve(src));

        Team { name, icon }
    }

    fn extract_tournament(&self, node: ElementRef<'_>) -> Tournament {
        let anchor = node.select(&self.tournament).next();

        let name = anchor
            .and_then(element_text)
            .unwrap_or_else(|| UNKNOWN_TOURNAMENT.to_string());
        let link = anchor
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| self.resolve(href));

        Tournament { name, link }
    }

    fn extract_date_time(&self, node: ElementRef<'_>) -> Option<DateTime<Utc>> {
        let raw = node.select(&self.timer).next()?.value().attr("data-timestamp")?;
        let secs = raw.trim().parse::<i64>().ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    fn extract_format(&self, node: ElementRef<'_>) -> Option<String> {
        node.select(&self.format)
            .next()
            .and_then(element_text)
            .map(|f| f.to_uppercase())
    }
}

impl MarkupSchema for SelectorSchema {
    fn version(&self) -> &str {
        &self.version
    }

    fn extract(&self, html: &str, game: &str) -> Vec<Match> {
        let document = Html::parse_document(html);

        let matches: Vec<Match> = document
            .select(&self.container)
            .map(|node| Match {
                team_left:  self.extract_team(node, &self.left),
                team_right: self.extract_team(node, &self.right),
                tournament: self.extract_tournament(node),
                date_time:  self.extract_date_time(node),
                format:     self.extract_format(node),
                game:       game.to_string(),
            })
            .collect();

        debug!("{} [{}]: extracted {} match blocks", game, self.version, matches.len());
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn main_page() -> SelectorSchema {
        SelectorSchema::builtin("main-page-matches/v1").unwrap()
    }

    const FULL_BLOCK: &str = r#"
        <div class="mw-parser-output">
          <div class="match">
            <div class="team-left">
              <span class="team-template-image-icon"><img src="/commons/images/kc.png"></span>
              <span class="team-template-text"><a href="/leagueoflegends/Karmine_Corp"> Karmine Corp </a></span>
            </div>
            <div class="versus-lower"><abbr title="Best of 3"> Bo3 </abbr></div>
            <div class="team-right">
              <span class="team-template-text"><a href="/leagueoflegends/G2_Esports">G2 Esports</a></span>
            </div>
            <span class="timer-object" data-timestamp="1741971600"></span>
            <div class="tournament-text"><a href="/leagueoflegends/LEC/2025/Spring">LEC Spring</a></div>
          </div>
        </div>"#;

    #[test]
    fn extracts_every_field() {
        let matches = main_page().extract(FULL_BLOCK, "League of Legends");
        assert_eq!(matches.len(), 1);

        let m = &matches[0];
        assert_eq!(m.team_left.name, "Karmine Corp");
        assert_eq!(m.team_left.icon.as_deref(), Some("https://liquipedia.net/commons/images/kc.png"));
        assert_eq!(m.team_right.name, "G2 Esports");
        assert_eq!(m.team_right.icon, None);
        assert_eq!(m.tournament.name, "LEC Spring");
        assert_eq!(
            m.tournament.link.as_deref(),
            Some("https://liquipedia.net/leagueoflegends/LEC/2025/Spring")
        );
        assert_eq!(m.date_time, Utc.timestamp_opt(1_741_971_600, 0).single());
        assert_eq!(m.format.as_deref(), Some("BO3"));
        assert_eq!(m.game, "League of Legends");
    }

    #[test]
    fn missing_team_link_defaults_to_unknown() {
        let html = r#"
            <div class="match">
              <div class="team-left"><span class="team-template-text">TBD</span></div>
              <div class="team-right"><span class="team-template-text"><a>Vitality</a></span></div>
            </div>"#;
        let m = &main_page().extract(html, "Valorant")[0];
        assert_eq!(m.team_left.name, UNKNOWN_TEAM);
        assert_eq!(m.team_left.icon, None);
        assert_eq!(m.team_right.name, "Vitality");
        assert_eq!(m.tournament.name, UNKNOWN_TOURNAMENT);
        assert_eq!(m.tournament.link, None);
        assert_eq!(m.date_time, None);
        assert_eq!(m.format, None);
    }

    #[test]
    fn empty_anchor_text_counts_as_missing() {
        let html = r#"
            <div class="match">
              <div class="team-left"><span class="team-template-text"><a href="/x">   </a></span></div>
              <div class="tournament-text"><a>  </a></div>
              <div class="versus-lower"><abbr> </abbr></div>
            </div>"#;
        let m = &main_page().extract(html, "Valorant")[0];
        assert_eq!(m.team_left.name, UNKNOWN_TEAM);
        assert_eq!(m.tournament.name, UNKNOWN_TOURNAMENT);
        assert_eq!(m.tournament.link, None);
        assert_eq!(m.format, None);
    }

    #[test]
    fn garbage_timestamp_is_dropped() {
        let html = r#"<div class="match"><span class="timer-object" data-timestamp="soon"></span></div>"#;
        let m = &main_page().extract(html, "Rocket League")[0];
        assert_eq!(m.date_time, None);
    }

    #[test]
    fn no_container_yields_nothing() {
        assert!(main_page().extract("<p>No upcoming matches</p>", "TFT").is_empty());
        assert!(main_page().extract("", "TFT").is_empty());
    }

    #[test]
    fn keeps_document_order() {
        let html = r#"
            <div class="match"><div class="team-left"><span class="team-template-text"><a>A</a></span></div></div>
            <div class="match"><div class="team-left"><span class="team-template-text"><a>B</a></span></div></div>
            <div class="match"><div class="team-left"><span class="team-template-text"><a>C</a></span></div></div>"#;
        let names: Vec<_> = main_page()
            .extract(html, "Valorant")
            .into_iter()
            .map(|m| m.team_left.name)
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn absolute_icon_urls_are_kept() {
        let html = r#"
            <div class="match"><div class="team-left">
              <span class="team-template-image-icon"><img src="https://cdn.example.org/kc.png"></span>
            </div></div>"#;
        let m = &main_page().extract(html, "Valorant")[0];
        assert_eq!(m.team_left.icon.as_deref(), Some("https://cdn.example.org/kc.png"));
    }

    #[test]
    fn unknown_schema_is_rejected() {
        assert!(matches!(
            SelectorSchema::builtin("main-page-matches/v9"),
            Err(SchemaError::Unknown(_))
        ));
    }

    #[test]
    fn bad_selector_is_a_config_error() {
        let spec = SelectorSpec { container: "div[", ..MAIN_PAGE_MATCHES };
        assert!(matches!(
            SelectorSchema::compile(&spec, BASE_URL),
            Err(SchemaError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn every_builtin_compiles() {
        for spec in BUILTIN_SPECS {
            let schema = SelectorSchema::compile(&spec, BASE_URL).unwrap();
            assert_eq!(schema.version(), spec.version);
        }
    }
}
