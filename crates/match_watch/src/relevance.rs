//! Relevance filter: watched team on either side, optionally "today" only.

use chrono::{DateTime, TimeZone, Utc};
use wiki_scraper::Match;

use crate::registry::{ComparisonPolicy, RegistryEntry, TemporalPolicy, Watch};

/// Same year/month/day as `now`, in `now`'s time zone.
pub fn is_same_local_day<Tz: TimeZone>(instant: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    instant.with_timezone(&now.timezone()).date_naive() == now.date_naive()
}

/// Local calendar day of `instant` already over at `now`.
pub fn is_before_local_day<Tz: TimeZone>(instant: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    instant.with_timezone(&now.timezone()).date_naive() < now.date_naive()
}

/// A match without a timer is never "today".
pub fn is_today<Tz: TimeZone>(date_time: Option<&DateTime<Utc>>, now: &DateTime<Tz>) -> bool {
    date_time.is_some_and(|dt| is_same_local_day(dt, now))
}

pub fn team_matches(team_name: &str, watched: &str, policy: ComparisonPolicy) -> bool {
    match policy {
        ComparisonPolicy::Exact => team_name == watched,
        ComparisonPolicy::Substring => team_name.contains(watched),
    }
}

pub fn involves_watched(m: &Match, watch: &Watch, policy: ComparisonPolicy) -> bool {
    watch.teams().iter().any(|watched| {
        team_matches(&m.team_left.name, watched, policy)
            || team_matches(&m.team_right.name, watched, policy)
    })
}

pub fn is_relevant<Tz: TimeZone>(m: &Match, entry: &RegistryEntry, now: &DateTime<Tz>) -> bool {
    if !m.is_meaningful() {
        return false;
    }
    if !involves_watched(m, &entry.watch, entry.comparison) {
        return false;
    }
    match entry.temporal {
        TemporalPolicy::TodayOnly => is_today(m.date_time.as_ref(), now),
        TemporalPolicy::Any => true,
    }
}
