//! Match records as they come out of the wiki markup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_TEAM: &str = "Unknown Team";
pub const UNKNOWN_TOURNAMENT: &str = "Unknown Tournament";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub icon: Option<String>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), icon: None }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_TEAM)
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_TEAM
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub name: String,
    pub link: Option<String>,
}

impl Tournament {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), link: None }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_TOURNAMENT)
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_TOURNAMENT
    }
}

/// One scheduled fixture between two teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub team_left:  Team,
    pub team_right: Team,
    pub tournament: Tournament,
    pub date_time:  Option<DateTime<Utc>>,
    pub format:     Option<String>,   // "BO3", "BO5"
    pub game:       String,
}

impl Match {
    /// At least one side resolved to a real team.
    pub fn is_meaningful(&self) -> bool {
        !self.team_left.is_unknown() || !self.team_right.is_unknown()
    }

    pub fn identity(&self) -> MatchIdentity {
        MatchIdentity {
            game:       self.game.clone(),
            team_left:  self.team_left.name.clone(),
            team_right: self.team_right.name.clone(),
            date_time:  self.date_time,
            tournament: self.tournament.name.clone(),
        }
    }

    /// Milliseconds since epoch; a match without a timer sorts as epoch zero.
    pub fn sort_key(&self) -> i64 {
        self.date_time.map_or(0, |dt| dt.timestamp_millis())
    }
}

/// Dedup key derived from a [`Match`]. Never stored on the match itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchIdentity {
    pub game:       String,
    pub team_left:  String,
    pub team_right: String,
    pub date_time:  Option<DateTime<Utc>>,
    pub tournament: String,
}
