//! matchday: Match Watch
//!
//! Extraction → relevance → dedup → sort pipeline over the source registry.
//! - registry: which endpoints to poll and which teams to watch there
//! - relevance: exact / substring team match, optional "today only"
//! - dedup: seen-match store, pruned to the current day each cycle
//! - pipeline: one cycle, sources isolated from each other's failures

pub mod dedup;
pub mod pipeline;
pub mod registry;
pub mod relevance;

pub use dedup::{MemorySeenStore, NullDatePolicy, SeenStore};
pub use pipeline::{sort_by_date, CycleReport, FragmentSource, Pipeline, SourceCounts, SourceReport};
pub use registry::{
    ComparisonPolicy, RegistryEntry, RegistryError, SourceRegistry, TemporalPolicy, Watch,
};
pub use relevance::{involves_watched, is_relevant, is_today};
