use std::fs;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use logger::EventLogger;
use match_watch::{
    ComparisonPolicy, MemorySeenStore, Pipeline, RegistryEntry, SourceRegistry, TemporalPolicy, Watch,
};
use serde_json::json;
use wiki_scraper::{EndpointFormat, FetchError, FetcherConfig, FragmentFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> FragmentFetcher {
    FragmentFetcher::new(&FetcherConfig {
        timeout: Duration::from_secs(2),
        min_request_interval: Duration::ZERO,
        ..FetcherConfig::default()
    })
    .unwrap()
}

fn envelope(html: &str) -> serde_json::Value {
    json!({ "parse": { "title": "Liquipedia:Matches", "pageid": 0, "text": { "*": html } } })
}

fn block(left: &str, right: &str, ts: i64) -> String {
    format!(
        r#"<div class="match">
             <div class="team-left"><span class="team-template-text"><a>{left}</a></span></div>
             <div class="team-right"><span class="team-template-text"><a>{right}</a></span></div>
             <span class="timer-object" data-timestamp="{ts}"></span>
             <div class="tournament-text"><a href="/x/Cup">Cup</a></div>
           </div>"#
    )
}

fn entry(server: &MockServer, game: &str, wiki: &str) -> RegistryEntry {
    RegistryEntry {
        game:       game.to_string(),
        endpoint:   format!("{}/{wiki}/api.php?action=parse&format=json&prop=text", server.uri()),
        format:     EndpointFormat::ParseApi,
        schema:     "main-page-matches/v1".to_string(),
        watch:      Watch::List(vec!["KC".into(), "Karmine Corp".into()]),
        comparison: ComparisonPolicy::Substring,
        temporal:   TemporalPolicy::Any,
    }
}

async fn mount(server: &MockServer, wiki: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/{wiki}/api.php")))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn merges_healthy_sources_over_http() {
    let server = MockServer::start().await;
    mount(
        &server,
        "leagueoflegends",
        ResponseTemplate::new(200).set_body_json(envelope(&block("Karmine Corp", "G2 Esports", 1741971600))),
    )
    .await;
    mount(&server, "valorant", ResponseTemplate::new(500)).await;
    mount(
        &server,
        "rocketleague",
        ResponseTemplate::new(200).set_body_json(envelope(&block("KC", "BDS", 1741964400))),
    )
    .await;

    let registry = SourceRegistry::new(vec![
        entry(&server, "League of Legends", "leagueoflegends"),
        entry(&server, "Valorant", "valorant"),
        entry(&server, "Rocket League", "rocketleague"),
    ])
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(registry, fetcher(), MemorySeenStore::default())
        .unwrap()
        .with_event_log(EventLogger::new(dir.path()));

    let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
    let report = pipeline.run_cycle_at(&now).await;

    let games: Vec<_> = report.matches.iter().map(|m| m.game.as_str()).collect();
    assert_eq!(games, ["Rocket League", "League of Legends"]);
    assert_eq!(report.healthy_sources(), 2);
    assert!(matches!(
        report.sources[1].result,
        Err(FetchError::Status { status, .. }) if status.as_u16() == 500
    ));

    let date = Utc::now().format("%Y-%m-%d").to_string();
    let raw = fs::read_to_string(dir.path().join(format!("{date}.jsonl"))).unwrap();
    let events: Vec<serde_json::Value> = raw.lines().map(|l| serde_json::from_str(l).unwrap()).collect();

    assert_eq!(events.len(), 4);
    assert_eq!(events[1]["event"], "SOURCE_STATUS");
    assert_eq!(events[1]["game"], "Valorant");
    assert_eq!(events[1]["ok"], false);
    assert_eq!(events[3]["event"], "CYCLE_COMPLETED");
    assert_eq!(events[3]["surfaced"], 2);
    assert_eq!(events[3]["healthy_sources"], 2);
}

#[tokio::test]
async fn api_error_envelope_marks_source_unhealthy() {
    let server = MockServer::start().await;
    mount(
        &server,
        "leagueoflegends",
        ResponseTemplate::new(200)
            .set_body_json(json!({ "error": { "code": "ratelimited", "info": "slow down" } })),
    )
    .await;

    let registry = SourceRegistry::new(vec![entry(&server, "League of Legends", "leagueoflegends")]).unwrap();
    let pipeline = Pipeline::new(registry, fetcher(), MemorySeenStore::default()).unwrap();
    let report = pipeline.run_cycle().await;

    assert!(report.matches.is_empty());
    assert_eq!(report.healthy_sources(), 0);
    assert!(matches!(report.sources[0].result, Err(FetchError::InvalidResponse { .. })));
}
