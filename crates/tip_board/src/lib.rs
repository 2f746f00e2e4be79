//! TipsLive: Tip Board
//! Scores fetched events, applies the pick policy, builds accumulators,
//! finds surebets and ranks safe / top bets. Output goes out as full-table
//! replacement batches through a `TableSink`.

pub mod rows;
pub mod surebet;

pub use rows::{BoardRows, IndividualRow, LegRow, MultipleRow, SurebetRow};
pub use surebet::{detect_surebet, find_surebets, Surebet, SurebetLeg};

use anyhow::Result;
use logger::{
    now_iso, EventLogger, RunSummaryEvent, SurebetEvent, TipAccumulatorEvent, TipPickEvent,
};
use odds_feed::{resolve_h2h, MatchEvent};
use serde::Serialize;
use tracing::{debug, info, warn};
use value_engine::{Accumulator, Confidence, Pick, ValuationEngine, ValueError};

pub const MARKET_1X2: &str = "1X2";

#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    /// Keep picks with EV strictly above this. 0.0 or a small edge like 0.02.
    pub min_expected_value: f64,
    pub accumulator_legs:   usize,
    pub max_accumulators:   usize,
    pub safe_single_min_ev:            f64,
    pub safe_single_min_probability:   f64,
    pub safe_multiple_min_ev:          f64,
    pub safe_multiple_min_probability: f64,
    pub top_size: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            min_expected_value: 0.0,
            accumulator_legs:   2,
            max_accumulators:   3,
            safe_single_min_ev:            0.25,
            safe_single_min_probability:   0.75,
            safe_multiple_min_ev:          0.30,
            safe_multiple_min_probability: 0.70,
            top_size: 5,
        }
    }
}

// ── Records ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPick {
    pub event_id:   String,
    #[serde(rename = "match")]
    pub match_name: String,
    pub league:     String,
    pub bookmaker:  String,
    pub market:     &'static str,
    pub simulated:  bool,
    pub pick:       Pick,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardAccumulator {
    pub legs:        Vec<ScoredPick>,
    pub accumulator: Accumulator,
}

impl BoardAccumulator {
    /// One simulated leg is enough to make the whole ticket non-authoritative.
    pub fn simulated(&self) -> bool {
        self.legs.iter().any(|l| l.simulated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Tip {
    Individual(ScoredPick),
    Multiple(BoardAccumulator),
}

impl Tip {
    pub fn expected_value(&self) -> f64 {
        match self {
            Tip::Individual(p) => p.pick.expected_value(),
            Tip::Multiple(m) => m.accumulator.combined_expected_value(),
        }
    }

    pub fn probability(&self) -> f64 {
        match self {
            Tip::Individual(p) => p.pick.fair_probability(),
            Tip::Multiple(m) => m.accumulator.combined_probability(),
        }
    }
}

// ── Pipeline steps ───────────────────────────────────────────────────────────

/// One best pick per resolvable event, in event order. Events without a
/// well-formed 1X2 market or rejected by the engine are skipped.
pub fn score_events(events: &[MatchEvent], engine: &ValuationEngine) -> Vec<ScoredPick> {
    let mut picks = Vec::with_capacity(events.len());

    for ev in events {
        let Some(market) = resolve_h2h(ev) else {
            debug!(event = %ev.id, "no complete 1X2 market, skipped");
            continue;
        };

        let pick = engine
            .value_market(&market.outcomes)
            .and_then(|valued| engine.select_best_pick(&valued));

        match pick {
            Ok(pick) => picks.push(ScoredPick {
                event_id:   ev.id.clone(),
                match_name: ev.match_name(),
                league:     ev.league.clone(),
                bookmaker:  market.bookmaker,
                market:     MARKET_1X2,
                simulated:  ev.simulated,
                pick,
            }),
            Err(e) => warn!("{} ({}) rejected: {}", ev.match_name(), ev.id, e),
        }
    }

    picks
}

/// Positive-edge policy: keep EV > `min_expected_value`.
pub fn apply_pick_policy(picks: Vec<ScoredPick>, min_expected_value: f64) -> Vec<ScoredPick> {
    picks
        .into_iter()
        .filter(|p| p.pick.expected_value() > min_expected_value)
        .collect()
}

fn sort_by_ev_desc(picks: &mut [ScoredPick]) {
    picks.sort_by(|a, b| b.pick.expected_value().total_cmp(&a.pick.expected_value()));
}

/// Best picks first, consecutive groups of `legs`, at most `max` accumulators.
/// Leftover picks that do not fill a group are not used.
pub fn build_accumulators(
    picks:  &[ScoredPick],
    legs:   usize,
    max:    usize,
    engine: &ValuationEngine,
) -> std::result::Result<Vec<BoardAccumulator>, ValueError> {
    if legs < 2 {
        return Err(ValueError::InsufficientPicks { got: legs });
    }

    let mut sorted = picks.to_vec();
    sort_by_ev_desc(&mut sorted);

    sorted
        .chunks_exact(legs)
        .take(max)
        .map(|group| {
            let engine_picks: Vec<Pick> = group.iter().map(|p| p.pick.clone()).collect();
            Ok(BoardAccumulator {
                accumulator: engine.combine_accumulator(&engine_picks)?,
                legs:        group.to_vec(),
            })
        })
        .collect()
}

pub fn is_safe_single(pick: &ScoredPick, cfg: &BoardConfig) -> bool {
    pick.pick.expected_value() > cfg.safe_single_min_ev
        && pick.pick.fair_probability() > cfg.safe_single_min_probability
}

pub fn is_safe_multiple(acc: &BoardAccumulator, cfg: &BoardConfig) -> bool {
    acc.accumulator.combined_expected_value() > cfg.safe_multiple_min_ev
        && acc.accumulator.combined_probability() > cfg.safe_multiple_min_probability
}

// ── Board ────────────────────────────────────────────────────────────────────

pub trait TableSink {
    /// Clears the table, then writes `rows`. Returns rows written.
    fn replace_individuals(&mut self, rows: &[IndividualRow]) -> Result<usize>;
    fn replace_multiples(&mut self, rows: &[MultipleRow]) -> Result<usize>;
    fn replace_surebets(&mut self, rows: &[SurebetRow]) -> Result<usize>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub individual:       Vec<ScoredPick>,
    pub multiple:         Vec<BoardAccumulator>,
    pub surebets:         Vec<Surebet>,
    pub safe:             Vec<Tip>,
    pub top:              Vec<Tip>,
    pub events_in:        usize,
    pub simulated_events: usize,
}

impl Board {
    pub fn build(events: &[MatchEvent], engine: &ValuationEngine, cfg: &BoardConfig) -> Result<Self> {
        let scored = score_events(events, engine);
        let scored_count = scored.len();

        let mut individual = apply_pick_policy(scored, cfg.min_expected_value);
        sort_by_ev_desc(&mut individual);

        let multiple = build_accumulators(&individual, cfg.accumulator_legs, cfg.max_accumulators, engine)?;
        let surebets = find_surebets(events);

        let safe: Vec<Tip> = individual
            .iter()
            .filter(|p| is_safe_single(p, cfg))
            .cloned()
            .map(Tip::Individual)
            .chain(multiple.iter().filter(|m| is_safe_multiple(m, cfg)).cloned().map(Tip::Multiple))
            .collect();

        let mut top: Vec<Tip> = individual
            .iter()
            .cloned()
            .map(Tip::Individual)
            .chain(multiple.iter().cloned().map(Tip::Multiple))
            .collect();
        top.sort_by(|a, b| b.expected_value().total_cmp(&a.expected_value()));
        top.truncate(cfg.top_size);

        info!(
            events = events.len(),
            scored = scored_count,
            picks = individual.len(),
            accumulators = multiple.len(),
            surebets = surebets.len(),
            safe = safe.len(),
            "board built"
        );

        Ok(Self {
            individual,
            multiple,
            surebets,
            safe,
            top,
            events_in: events.len(),
            simulated_events: events.iter().filter(|e| e.simulated).count(),
        })
    }

    pub fn rows(&self) -> Result<BoardRows> {
        Ok(BoardRows {
            individuais: self.individual.iter().map(IndividualRow::from).collect(),
            multiplas:   self.multiple.iter().map(MultipleRow::from_accumulator).collect::<Result<_>>()?,
            surebets:    self.surebets.iter().map(SurebetRow::from_surebet).collect::<Result<_>>()?,
        })
    }

    /// Replaces all three tables with this board.
    pub fn publish<S: TableSink>(&self, sink: &mut S) -> Result<BoardRows> {
        let rows = self.rows()?;
        let n_ind = sink.replace_individuals(&rows.individuais)?;
        let n_mul = sink.replace_multiples(&rows.multiplas)?;
        let n_sur = sink.replace_surebets(&rows.surebets)?;
        info!("published {} individuais, {} multiplas, {} surebets", n_ind, n_mul, n_sur);
        Ok(rows)
    }

    pub fn very_high_picks(&self) -> impl Iterator<Item = &ScoredPick> {
        self.individual
            .iter()
            .filter(|p| p.pick.confidence() == Confidence::VeryHigh)
    }

    /// JSONL trail of the run. Write failures are logged, not fatal.
    pub fn log_events(&self, logger: &EventLogger, source: &str) -> usize {
        let mut written = 0usize;
        let mut write = |res: Result<()>| match res {
            Ok(())  => written += 1,
            Err(e)  => warn!("Log write failed: {e}"),
        };

        for p in &self.individual {
            write(logger.log(&TipPickEvent {
                ts:               now_iso(),
                event:            "TIP_PICK",
                event_id:         p.event_id.clone(),
                match_name:       p.match_name.clone(),
                league:           p.league.clone(),
                bet_type:         p.pick.label().to_string(),
                bookmaker:        p.bookmaker.clone(),
                odds:             p.pick.odds(),
                fair_probability: p.pick.fair_probability(),
                expected_value:   p.pick.expected_value(),
                confidence:       p.pick.confidence().as_str().to_string(),
                stake:            p.pick.stake().as_str().to_string(),
                simulated:        p.simulated,
            }));
        }

        for m in &self.multiple {
            write(logger.log(&TipAccumulatorEvent {
                ts:                      now_iso(),
                event:                   "TIP_ACCUMULATOR",
                legs:                    m.legs.iter().map(|l| format!("{}: {}", l.match_name, l.pick.label())).collect(),
                combined_odds:           m.accumulator.combined_odds(),
                combined_probability:    m.accumulator.combined_probability(),
                combined_expected_value: m.accumulator.combined_expected_value(),
                confidence:              m.accumulator.confidence().as_str().to_string(),
                simulated:               m.simulated(),
            }));
        }

        for s in &self.surebets {
            info!(
                roi = format!("{:.2}%", s.roi * 100.0),
                "{} | SUREBET found",
                s.match_name
            );
            write(logger.log(&SurebetEvent {
                ts:         now_iso(),
                event:      "SUREBET",
                event_id:   s.event_id.clone(),
                match_name: s.match_name.clone(),
                margin:     s.margin,
                roi_pct:    s.roi * 100.0,
                legs:       s.legs.iter().map(|l| format!("{} @ {:.2} ({})", l.label, l.odds, l.bookmaker)).collect(),
                simulated:  s.simulated,
            }));
        }

        write(logger.log(&RunSummaryEvent {
            ts:               now_iso(),
            event:            "RUN_SUMMARY",
            source:           source.to_string(),
            events_in:        self.events_in,
            simulated_events: self.simulated_events,
            picks:            self.individual.len(),
            accumulators:     self.multiple.len(),
            surebets:         self.surebets.len(),
            safe:             self.safe.len(),
        }));

        written
    }
}
