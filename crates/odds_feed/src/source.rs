//! Odds sources: where `MatchEvent`s come from.

use crate::MatchEvent;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

pub trait OddsSource {
    fn name(&self) -> &str;
    fn fetch_events(&self) -> Result<Vec<MatchEvent>>;

    /// Events tagged with the name of the source that actually supplied them.
    fn fetch(&self) -> Result<FetchedEvents> {
        Ok(FetchedEvents { source: self.name().to_string(), events: self.fetch_events()? })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedEvents {
    pub source: String,
    pub events: Vec<MatchEvent>,
}

/// JSON array of provider-shaped events on disk (e.g. a saved odds-API dump).
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OddsSource for JsonFileSource {
    fn name(&self) -> &str {
        "json_file"
    }

    fn fetch_events(&self) -> Result<Vec<MatchEvent>> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read odds file {}", self.path.display()))?;
        let events: Vec<MatchEvent> = serde_json::from_str(&raw)
            .with_context(|| format!("parse odds file {}", self.path.display()))?;
        info!("{}: {} events loaded", self.path.display(), events.len());
        Ok(events)
    }
}

/// Primary source, fallback when it fails or comes back empty.
pub struct FallbackSource<P, F> {
    primary:  P,
    fallback: F,
}

impl<P: OddsSource, F: OddsSource> FallbackSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: OddsSource, F: OddsSource> OddsSource for FallbackSource<P, F> {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn fetch_events(&self) -> Result<Vec<MatchEvent>> {
        Ok(self.fetch()?.events)
    }

    fn fetch(&self) -> Result<FetchedEvents> {
        match self.primary.fetch() {
            Ok(batch) if !batch.events.is_empty() => return Ok(batch),
            Ok(_) => warn!("{} returned no events, using {}", self.primary.name(), self.fallback.name()),
            Err(e) => warn!("{} failed: {:#}, using {}", self.primary.name(), e, self.fallback.name()),
        }
        self.fallback.fetch()
    }
}
