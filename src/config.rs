//! Runtime configuration, read from the environment after `.env` is loaded.

use match_watch::{NullDatePolicy, RegistryError, SourceRegistry};
use notifier::{DigestOptions, NTFY_SERVER};
use std::collections::hash_map::DefaultHasher;
use std::env;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;
use wiki_scraper::FetcherConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} is required for the {sink} sink")]
    Missing { key: &'static str, sink: &'static str },

    #[error("{key}: invalid value `{value}` ({reason})")]
    Invalid { key: &'static str, value: String, reason: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    Discord { token: String, channel_id: String },
    Ntfy { server: String, topic: String },
    Log,
}

impl SinkConfig {
    pub fn name(&self) -> &'static str {
        match self {
            SinkConfig::Discord { .. } => "discord",
            SinkConfig::Ntfy { .. } => "ntfy",
            SinkConfig::Log => "log",
        }
    }
}

#[derive(Debug)]
pub struct AppConfig {
    pub sink:             SinkConfig,
    pub digest:           DigestOptions,
    pub registry:         SourceRegistry,
    /// `None` when the built-in registry is used
    pub registry_path:    Option<PathBuf>,
    pub fetcher:          FetcherConfig,
    pub null_date_policy: NullDatePolicy,
    pub log_dir:          PathBuf,
    /// `None` runs a single cycle and exits
    pub poll_interval:    Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let sink = match get("MATCHDAY_SINK").as_deref() {
            None | Some("discord") => SinkConfig::Discord {
                token:      get("DISCORD_BOT_TOKEN")
                    .ok_or(ConfigError::Missing { key: "DISCORD_BOT_TOKEN", sink: "discord" })?,
                channel_id: get("DISCORD_CHANNEL_ID")
                    .ok_or(ConfigError::Missing { key: "DISCORD_CHANNEL_ID", sink: "discord" })?,
            },
            Some("ntfy") => SinkConfig::Ntfy {
                server: get("NTFY_SERVER").unwrap_or_else(|| NTFY_SERVER.to_string()),
                topic:  get("NTFY_TOPIC").ok_or(ConfigError::Missing { key: "NTFY_TOPIC", sink: "ntfy" })?,
            },
            Some("log") => SinkConfig::Log,
            Some(other) => return Err(invalid("MATCHDAY_SINK", other, "expected discord, ntfy or log")),
        };

        let mut digest = DigestOptions::default();
        if let Some(title) = get("MATCHDAY_DIGEST_TITLE") {
            digest.title = title;
        }
        digest.thumbnail = get("MATCHDAY_DIGEST_THUMBNAIL");

        let registry_path = get("MATCHDAY_REGISTRY").map(PathBuf::from);
        let registry = match &registry_path {
            Some(path) => SourceRegistry::load(path)?,
            None => SourceRegistry::builtin()?,
        };

        let defaults = FetcherConfig::default();
        let fetcher = FetcherConfig {
            timeout:              match get("MATCHDAY_HTTP_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(positive("MATCHDAY_HTTP_TIMEOUT_SECS", &v)?),
                None => defaults.timeout,
            },
            min_request_interval: match get("MATCHDAY_MIN_REQUEST_INTERVAL_MS") {
                Some(v) => Duration::from_millis(number("MATCHDAY_MIN_REQUEST_INTERVAL_MS", &v)?),
                None => defaults.min_request_interval,
            },
            user_agent:           get("MATCHDAY_USER_AGENT").unwrap_or(defaults.user_agent),
        };

        let null_date_policy = match get("MATCHDAY_NULL_DATE_POLICY").as_deref() {
            None | Some("keep") => NullDatePolicy::Keep,
            Some("discovery_day") => NullDatePolicy::DiscoveryDay,
            Some(other) => {
                return Err(invalid("MATCHDAY_NULL_DATE_POLICY", other, "expected keep or discovery_day"))
            }
        };

        let poll_interval = get("MATCHDAY_POLL_INTERVAL_SECS")
            .map(|v| positive("MATCHDAY_POLL_INTERVAL_SECS", &v).map(Duration::from_secs))
            .transpose()?;

        Ok(Self {
            sink,
            digest,
            registry,
            registry_path,
            fetcher,
            null_date_policy,
            log_dir: get("MATCHDAY_LOG_DIR").map_or_else(|| PathBuf::from("logs"), PathBuf::from),
            poll_interval,
        })
    }
}

impl AppConfig {
    /// One lock per registry, so instances watching different registries can run side by side.
    pub fn lock_file_name(&self) -> String {
        let Some(path) = &self.registry_path else {
            return "matchday.lock".to_string();
        };

        let stem: String = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();

        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        format!("matchday-{stem}-{:08x}.lock", hasher.finish() as u32)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { key, value: value.to_string(), reason: reason.into() }
}

fn number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|e| invalid(key, value, e.to_string()))
}

fn positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match number(key, value)? {
        0 => Err(invalid(key, value, "must be greater than zero")),
        n => Ok(n),
    }
}
