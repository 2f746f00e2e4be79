//! TipsLive: Logger
//! JSONL event stream, NTFY alerts

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

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

    /// Current day's file: `<log_dir>/YYYY-MM-DD.jsonl`
    pub fn current_path(&self) -> PathBuf {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        self.log_dir.join(format!("{date}.jsonl"))
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let path  = self.current_path();
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log {}", path.display()))?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event types ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct TipPickEvent {
    pub ts:               String,
    pub event:            &'static str,   // "TIP_PICK"
    pub event_id:         String,
    #[serde(rename = "match")]
    pub match_name:       String,
    pub league:           String,
    pub bet_type:         String,
    pub bookmaker:        String,
    pub odds:             f64,            // decimal
    pub fair_probability: f64,            // vig removed
    pub expected_value:   f64,
    pub confidence:       String,
    pub stake:            String,
    pub simulated:        bool,
}

#[derive(Serialize, Debug)]
pub struct TipAccumulatorEvent {
    pub ts:                      String,
    pub event:                   &'static str,   // "TIP_ACCUMULATOR"
    pub legs:                    Vec<String>,
    pub combined_odds:           f64,
    pub combined_probability:    f64,
    pub combined_expected_value: f64,
    pub confidence:              String,
    pub simulated:               bool,
}

#[derive(Serialize, Debug)]
pub struct SurebetEvent {
    pub ts:       String,
    pub event:    &'static str,   // "SUREBET"
    pub event_id: String,
    #[serde(rename = "match")]
    pub match_name: String,
    pub margin:   f64,
    pub roi_pct:  f64,
    pub legs:     Vec<String>,    // "label @ odds (bookmaker)"
    pub simulated: bool,
}

#[derive(Serialize, Debug)]
pub struct RunSummaryEvent {
    pub ts:               String,
    pub event:            &'static str,   // "RUN_SUMMARY"
    pub source:           String,
    pub events_in:        usize,
    pub simulated_events: usize,
    pub picks:            usize,
    pub accumulators:     usize,
    pub surebets:         usize,
    pub safe:             usize,
}

/// Push alert to ntfy.sh/<topic>
pub async fn send_ntfy_alert(topic: &str, msg: &str, title: &str) {
    let client = reqwest::Client::new();
    match client
        .post(format!("https://ntfy.sh/{topic}"))
        .header("Title", title)
        .header("Priority", "high")
        .header("Tags", "soccer")
        .body(msg.to_string())
        .send()
        .await
    {
        Ok(_)  => tracing::info!("NTFY sent: {}", title),
        Err(e) => tracing::warn!("NTFY failed: {}", e),
    }
}
