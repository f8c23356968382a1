use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use wiki_scraper::{MarkupSchema, SelectorSchema, UNKNOWN_TEAM};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn main_page_fixture_yields_all_blocks() {
    let schema = SelectorSchema::builtin("main-page-matches/v1").unwrap();
    let matches = schema.extract(&read_fixture("main_page_upcoming.html"), "League of Legends");
    assert_eq!(matches.len(), 4);

    let kc_g2 = &matches[0];
    assert_eq!(kc_g2.team_left.name, "Karmine Corp");
    assert_eq!(
        kc_g2.team_left.icon.as_deref(),
        Some("https://liquipedia.net/commons/images/thumb/4/48/Karmine_Corp_2020_lightmode.png/50px-Karmine_Corp_2020_lightmode.png")
    );
    assert_eq!(kc_g2.team_right.name, "G2 Esports");
    assert!(kc_g2.team_right.icon.is_some());
    assert_eq!(kc_g2.tournament.name, "LEC Spring");
    assert_eq!(
        kc_g2.tournament.link.as_deref(),
        Some("https://liquipedia.net/leagueoflegends/LEC/2025/Spring")
    );
    assert_eq!(kc_g2.date_time, Utc.with_ymd_and_hms(2025, 3, 14, 17, 0, 0).single());
    assert_eq!(kc_g2.format.as_deref(), Some("BO3"));

    assert_eq!(matches[1].team_left.name, "Karmine Corp Blue");
    assert_eq!(matches[1].format.as_deref(), Some("BO1"));
    assert_eq!(matches[1].date_time, Utc.with_ymd_and_hms(2025, 3, 14, 15, 0, 0).single());
}

#[test]
fn main_page_fixture_degrades_tbd_block() {
    let schema = SelectorSchema::builtin("main-page-matches/v1").unwrap();
    let matches = schema.extract(&read_fixture("main_page_upcoming.html"), "League of Legends");

    let tbd = &matches[2];
    assert_eq!(tbd.team_left.name, UNKNOWN_TEAM);
    assert_eq!(tbd.team_left.icon, None);
    assert_eq!(tbd.team_right.name, "Karmine Corp");
    assert_eq!(tbd.date_time, None);
    assert_eq!(tbd.format, None);
    assert_eq!(tbd.tournament.name, "LEC Spring Playoffs");
    assert!(tbd.is_meaningful());
}

#[test]
fn team_page_fixture_reads_only_the_infobox() {
    let schema = SelectorSchema::builtin("team-infobox/v1").unwrap();
    let matches = schema.extract(&read_fixture("team_page.html"), "Valorant");
    assert_eq!(matches.len(), 2);

    assert_eq!(matches[0].team_left.name, "KC");
    assert_eq!(matches[0].team_right.name, "TH");
    assert_eq!(matches[0].format.as_deref(), Some("BO3"));
    assert_eq!(matches[0].tournament.name, "VCT 2025: EMEA Stage 1");
    assert_eq!(
        matches[0].tournament.link.as_deref(),
        Some("https://liquipedia.net/valorant/VCT/2025/EMEA_League/Stage_1")
    );
    assert_eq!(matches[1].team_right.name, "KC");
    assert_eq!(matches[1].date_time, Utc.with_ymd_and_hms(2025, 3, 16, 17, 0, 0).single());
}

#[test]
fn schemas_do_not_cross_match() {
    let team_page = SelectorSchema::builtin("team-infobox/v1").unwrap();
    let main_page = SelectorSchema::builtin("main-page-matches/v1").unwrap();

    assert!(main_page.extract(&read_fixture("team_page.html"), "Valorant").is_empty());
    assert!(team_page.extract(&read_fixture("main_page_upcoming.html"), "Valorant").is_empty());
}
