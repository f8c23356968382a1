//! Liquipedia match-list scraper
//!
//! Fetches `MainPageMatches/Upcoming` fragments (or team pages) and turns the
//! markup into [`Match`] records. Extraction never fails: a missing element
//! degrades to a documented default.
//!
//! Parse API:
//! https://liquipedia.net/<wiki>/api.php?action=parse&format=json&prop=text&text={{MainPageMatches/Upcoming|...}}

pub mod fetcher;
pub mod model;
pub mod schema;

pub use fetcher::{EndpointFormat, FetchError, FetcherConfig, FragmentFetcher};
pub use model::{Match, MatchIdentity, Team, Tournament, UNKNOWN_TEAM, UNKNOWN_TOURNAMENT};
pub use schema::{MarkupSchema, SchemaError, SelectorSchema, SelectorSpec};

/// Relative icon and tournament links resolve against this.
pub const BASE_URL: &str = "https://liquipedia.net";
