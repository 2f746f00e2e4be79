//! TipsLive: Tip Runner
//!
//! What it does:
//!   1. Loads matches + odds (JSON dump, otherwise simulated data)
//!   2. Strips the overround, computes EV, picks the best tip per match
//!   3. Builds múltiplas, finds surebets, ranks top / safe tips
//!   4. Replaces the SQLite tables (delete-all → insert), JSONL log, NTFY alert
//!
//! Run:
//!   cargo run --bin tip-runner

mod config;
mod tip_store;

use anyhow::{Context, Result};
use config::RunnerConfig;
use dotenv::dotenv;
use logger::{send_ntfy_alert, EventLogger};
use odds_feed::{FallbackSource, FetchedEvents, JsonFileSource, OddsSource, SimulatedSource};
use std::env;
use std::fs::File;
use tip_board::Board;
use tip_store::TipStore;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use value_engine::ValuationEngine;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!("=== TipsLive Runner ===");

    // Single instance lock
    let lock_file_path = env::temp_dir().join("tipslive_runner.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of tip-runner is already running! Exiting.");
            return Ok(());
        }
    };

    let cfg = RunnerConfig::from_env().context("load config")?;
    info!(
        db = %cfg.db_path,
        logs = %cfg.log_dir,
        min_ev = cfg.board.min_expected_value,
        legs = cfg.board.accumulator_legs,
        "config loaded"
    );

    let source: Box<dyn OddsSource> = match &cfg.odds_file {
        Some(path) => {
            info!("Odds file: {}", path.display());
            Box::new(FallbackSource::new(
                JsonFileSource::new(path),
                SimulatedSource::new(cfg.sim_seed),
            ))
        }
        None => {
            warn!("TIPS_ODDS_FILE not set, using SIMULATED odds (non-authoritative)");
            Box::new(SimulatedSource::new(cfg.sim_seed))
        }
    };

    let engine = ValuationEngine::new();
    let logger = EventLogger::new(&cfg.log_dir);
    let mut store = TipStore::open(&cfg.db_path)?;

    loop {
        if let Err(e) = run_cycle(source.as_ref(), &engine, &cfg, &mut store, &logger).await {
            error!("Run cycle failed: {:#}", e);
        }

        if cfg.poll_interval_secs == 0 {
            break;
        }
        sleep(Duration::from_secs(cfg.poll_interval_secs)).await;
    }

    Ok(())
}

async fn run_cycle(
    source: &dyn OddsSource,
    engine: &ValuationEngine,
    cfg:    &RunnerConfig,
    store:  &mut TipStore,
    logger: &EventLogger,
) -> Result<()> {
    info!("--- Tip cycle ---");

    let FetchedEvents { source: supplied_by, events } = source.fetch().context("fetch events")?;
    let simulated = events.iter().filter(|e| e.simulated).count();
    if simulated > 0 {
        warn!("{simulated}/{} events from {supplied_by} carry simulated odds", events.len());
    }

    let board = Board::build(&events, engine, &cfg.board)?;
    board.publish(store).context("publish board")?;
    board.log_events(logger, &supplied_by);

    for (i, tip) in board.top.iter().enumerate() {
        info!(
            ev = format!("{:+.3}", tip.expected_value()),
            prob = format!("{:.2}", tip.probability()),
            "top #{}",
            i + 1
        );
    }

    if let Some(topic) = &cfg.ntfy_topic {
        let hot: Vec<String> = board
            .very_high_picks()
            .map(|p| format!("{}: {} @ {:.2} (EV {:+.1}%)", p.match_name, p.pick.label(), p.pick.odds(), p.pick.expected_value() * 100.0))
            .collect();
        if !hot.is_empty() {
            send_ntfy_alert(topic, &hot.join("\n"), "TipsLive: VERY_HIGH tips").await;
        }
    }

    Ok(())
}
