//! matchday: Logger
//! JSONL audit stream: one file per UTC day, one event per line

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Events ──────────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct SourceStatusEvent {
    pub ts:        String,
    pub event:     &'static str,   // "SOURCE_STATUS"
    pub game:      String,
    pub endpoint:  String,
    pub ok:        bool,
    pub message:   String,         // "ok" or the fetch error
    pub extracted: usize,          // match blocks in the fragment
    pub relevant:  usize,          // after team/day filter
}

#[derive(Serialize, Debug)]
pub struct CycleCompletedEvent {
    pub ts:              String,
    pub event:           &'static str,   // "CYCLE_COMPLETED"
    pub healthy_sources: usize,
    pub total_sources:   usize,
    pub candidates:      usize,
    pub surfaced:        usize,          // new this cycle
    pub pruned:          usize,          // dropped from the seen store
    pub seen_size:       usize,
}

#[derive(Serialize, Debug)]
pub struct DigestDeliveredEvent {
    pub ts:      String,
    pub event:   &'static str,   // "DIGEST_DELIVERED"
    pub sink:    String,
    pub matches: usize,
    pub ok:      bool,
    pub message: String,
}
