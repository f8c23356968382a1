//! One polling cycle: prune → fetch/extract/filter per source → dedup → sort.
//!
//! Sources run concurrently and fail independently; a failed source simply
//! contributes nothing. The seen store is consulted afterwards, in registry
//! order, so discovery order is deterministic for equal kickoff times.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use futures_util::future::join_all;
use logger::{now_iso, CycleCompletedEvent, EventLogger, SourceStatusEvent};
use tracing::{debug, info, warn};
use wiki_scraper::{FetchError, FragmentFetcher, MarkupSchema, Match, SchemaError, SelectorSchema};

use crate::dedup::SeenStore;
use crate::registry::{RegistryEntry, SourceRegistry};
use crate::relevance::is_relevant;

/// Where markup fragments come from.
#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn fetch_fragment(&self, entry: &RegistryEntry) -> Result<String, FetchError>;
}

#[async_trait]
impl FragmentSource for FragmentFetcher {
    async fn fetch_fragment(&self, entry: &RegistryEntry) -> Result<String, FetchError> {
        self.fetch(&entry.endpoint, entry.format).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceCounts {
    pub extracted: usize,
    pub relevant:  usize,
}

#[derive(Debug)]
pub struct SourceReport {
    pub game:     String,
    pub endpoint: String,
    pub result:   Result<SourceCounts, FetchError>,
}

#[derive(Debug)]
pub struct CycleReport {
    /// Newly surfaced matches, oldest kickoff first
    pub matches:    Vec<Match>,
    pub sources:    Vec<SourceReport>,
    /// Relevant matches before dedup
    pub candidates: usize,
    pub pruned:     usize,
}

impl CycleReport {
    pub fn healthy_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.result.is_ok()).count()
    }
}

/// Ascending by kickoff, undated first, stable for ties.
pub fn sort_by_date(matches: &mut [Match]) {
    matches.sort_by_key(Match::sort_key);
}

pub struct Pipeline<F, S> {
    registry: SourceRegistry,
    schemas:  Vec<Box<dyn MarkupSchema>>,
    source:   F,
    store:    S,
    events:   Option<EventLogger>,
}

impl<F: FragmentSource, S: SeenStore> Pipeline<F, S> {
    pub fn new(registry: SourceRegistry, source: F, store: S) -> Result<Self, SchemaError> {
        let schemas = registry
            .entries()
            .iter()
            .map(|entry| {
                SelectorSchema::builtin(&entry.schema).map(|s| Box::new(s) as Box<dyn MarkupSchema>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { registry, schemas, source, store, events: None })
    }

    /// Also write SOURCE_STATUS / CYCLE_COMPLETED lines to a JSONL audit log.
    pub fn with_event_log(mut self, events: EventLogger) -> Self {
        self.events = Some(events);
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_at(&Local::now()).await
    }

    pub async fn run_cycle_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> CycleReport {
        let pruned = self.store.prune_to_today(now);
        if pruned > 0 {
            debug!("pruned {} seen matches from previous days", pruned);
        }

        let passes = self
            .registry
            .entries()
            .iter()
            .zip(&self.schemas)
            .map(|(entry, schema)| self.run_source(entry, schema.as_ref(), now));
        let results = join_all(passes).await;

        let mut matches = Vec::new();
        let mut sources = Vec::with_capacity(results.len());
        let mut candidates = 0;

        for (entry, result) in self.registry.entries().iter().zip(results) {
            let result = result.map(|(extracted, relevant)| {
                let counts = SourceCounts { extracted, relevant: relevant.len() };
                candidates += counts.relevant;
                matches.extend(relevant.into_iter().filter(|m| self.store.is_new(m, now)));
                counts
            });

            self.log_source(entry, &result);
            sources.push(SourceReport {
                game:     entry.game.clone(),
                endpoint: entry.endpoint.clone(),
                result,
            });
        }

        sort_by_date(&mut matches);

        let report = CycleReport { matches, sources, candidates, pruned };
        self.log_cycle(&report);
        report
    }

    /// Fetch, extract and filter one registry entry: (blocks extracted, relevant matches).
    async fn run_source<Tz: TimeZone>(
        &self,
        entry: &RegistryEntry,
        schema: &dyn MarkupSchema,
        now: &DateTime<Tz>,
    ) -> Result<(usize, Vec<Match>), FetchError> {
        let html = self.source.fetch_fragment(entry).await.map_err(|e| {
            warn!("{} source failed, skipping: {}", entry.game, e);
            e
        })?;

        let extracted = schema.extract(&html, &entry.game);
        let total = extracted.len();
        let relevant: Vec<Match> = extracted
            .into_iter()
            .filter(|m| is_relevant(m, entry, now))
            .collect();

        debug!("{}: {} blocks, {} relevant", entry.game, total, relevant.len());
        Ok((total, relevant))
    }

    fn log_source(&self, entry: &RegistryEntry, result: &Result<SourceCounts, FetchError>) {
        let Some(events) = &self.events else { return };

        let (ok, message, counts) = match result {
            Ok(counts) => (true, "ok".to_string(), *counts),
            Err(e) => (false, e.to_string(), SourceCounts { extracted: 0, relevant: 0 }),
        };

        let _ = events.log(&SourceStatusEvent {
            ts:        now_iso(),
            event:     "SOURCE_STATUS",
            game:      entry.game.clone(),
            endpoint:  entry.endpoint.clone(),
            ok,
            message,
            extracted: counts.extracted,
            relevant:  counts.relevant,
        });
    }

    fn log_cycle(&self, report: &CycleReport) {
        let healthy = report.healthy_sources();
        let total = report.sources.len();

        info!(
            "Cycle completed. {} new of {} relevant matches (healthy: {}/{}).",
            report.matches.len(),
            report.candidates,
            healthy,
            total
        );

        if let Some(events) = &self.events {
            let _ = events.log(&CycleCompletedEvent {
                ts:              now_iso(),
                event:           "CYCLE_COMPLETED",
                healthy_sources: healthy,
                total_sources:   total,
                candidates:      report.candidates,
                surfaced:        report.matches.len(),
                pruned:          report.pruned,
                seen_size:       self.store.len(),
            });
        }
    }
}
