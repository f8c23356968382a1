//! Seen-match store.
//!
//! Remembers every match identity already surfaced so repeated polling does
//! not announce it twice. Identities dated before today are pruned at the
//! start of each cycle; future ones stay until their day has passed. A
//! restart forgets everything.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use wiki_scraper::{Match, MatchIdentity};

use crate::relevance::is_before_local_day;

/// What pruning does with identities that carry no match time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullDatePolicy {
    /// Never pruned; the match stays suppressed for the process lifetime
    #[default]
    Keep,
    /// Pruned once the day it was first surfaced is over
    DiscoveryDay,
}

pub trait SeenStore: Send + Sync {
    /// True the first time an identity is offered, false on every repeat.
    fn is_new<Tz: TimeZone>(&self, m: &Match, now: &DateTime<Tz>) -> bool;

    /// Drop identities whose day is over; returns how many went.
    fn prune_to_today<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [`SeenStore`]; one writer at a time behind a mutex.
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    policy: NullDatePolicy,
    /// identity → first surfaced at
    seen:   Mutex<HashMap<MatchIdentity, DateTime<Utc>>>,
}

impl MemorySeenStore {
    pub fn new(policy: NullDatePolicy) -> Self {
        Self { policy, seen: Mutex::new(HashMap::new()) }
    }

    pub fn policy(&self) -> NullDatePolicy {
        self.policy
    }

    fn seen(&self) -> MutexGuard<'_, HashMap<MatchIdentity, DateTime<Utc>>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SeenStore for MemorySeenStore {
    fn is_new<Tz: TimeZone>(&self, m: &Match, now: &DateTime<Tz>) -> bool {
        let mut seen = self.seen();
        let identity = m.identity();
        if seen.contains_key(&identity) {
            return false;
        }
        seen.insert(identity, now.with_timezone(&Utc));
        true
    }

    fn prune_to_today<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> usize {
        let policy = self.policy;
        let mut seen = self.seen();
        let before = seen.len();

        seen.retain(|identity, first_seen| match (&identity.date_time, policy) {
            (Some(dt), _) => !is_before_local_day(dt, now),
            (None, NullDatePolicy::Keep) => true,
            (None, NullDatePolicy::DiscoveryDay) => !is_before_local_day(first_seen, now),
        });

        before - seen.len()
    }

    fn len(&self) -> usize {
        self.seen().len()
    }
}
