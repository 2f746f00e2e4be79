use anyhow::{bail, Context, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tip_board::BoardConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Saved provider dump; `None` → simulated odds only
    pub odds_file:          Option<PathBuf>,
    pub db_path:            String,
    pub log_dir:            String,
    pub sim_seed:           u64,
    /// 0 = single run
    pub poll_interval_secs: u64,
    pub ntfy_topic:         Option<String>,
    pub board:              BoardConfig,
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let board = BoardConfig {
            min_expected_value: parse_or(&get, "TIPS_MIN_EV", 0.0)?,
            accumulator_legs:   parse_or(&get, "TIPS_ACCUMULATOR_LEGS", 2)?,
            max_accumulators:   parse_or(&get, "TIPS_MAX_ACCUMULATORS", 3)?,
            ..BoardConfig::default()
        };

        if !board.min_expected_value.is_finite() {
            bail!("TIPS_MIN_EV must be a finite number");
        }
        if board.accumulator_legs < 2 {
            bail!("TIPS_ACCUMULATOR_LEGS must be at least 2, got {}", board.accumulator_legs);
        }

        Ok(Self {
            odds_file:          non_empty("TIPS_ODDS_FILE").map(PathBuf::from),
            db_path:            non_empty("TIPS_DB_PATH").unwrap_or_else(|| "data/tips.db".to_string()),
            log_dir:            non_empty("TIPS_LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            sim_seed:           parse_or(&get, "TIPS_SIM_SEED", 42)?,
            poll_interval_secs: parse_or(&get, "TIPS_POLL_INTERVAL_SECS", 0)?,
            ntfy_topic:         non_empty("NTFY_TOPIC"),
            board,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid {key}={raw}")),
    }
}
