//! Surebets: best price per outcome across books, implied sum < 1.

use odds_feed::{best_prices, MatchEvent};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurebetLeg {
    pub label:       String,
    pub bookmaker:   String,
    pub odds:        f64,
    /// Fraction of the total stake for an equal payout on every outcome.
    pub stake_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surebet {
    pub event_id:   String,
    #[serde(rename = "match")]
    pub match_name: String,
    pub league:     String,
    /// Σ 1/best_odds, < 1.0 for every surebet
    pub margin:     f64,
    pub roi:        f64,
    pub legs:       Vec<SurebetLeg>,
    pub simulated:  bool,
}

/// Needs winning legs from at least two distinct bookmakers.
pub fn detect_surebet(event: &MatchEvent) -> Option<Surebet> {
    let best = best_prices(event)?;
    let first_book = &best.first()?.bookmaker;
    if best.iter().all(|b| &b.bookmaker == first_book) {
        return None;
    }
    let margin: f64 = best.iter().map(|b| 1.0 / b.odds).sum();
    if margin >= 1.0 {
        return None;
    }

    let legs = best
        .into_iter()
        .map(|b| SurebetLeg {
            stake_share: (1.0 / b.odds) / margin,
            label:       b.label,
            bookmaker:   b.bookmaker,
            odds:        b.odds,
        })
        .collect();

    Some(Surebet {
        event_id:   event.id.clone(),
        match_name: event.match_name(),
        league:     event.league.clone(),
        margin,
        roi:        1.0 / margin - 1.0,
        legs,
        simulated:  event.simulated,
    })
}

/// All surebets, best ROI first.
pub fn find_surebets(events: &[MatchEvent]) -> Vec<Surebet> {
    let mut found: Vec<Surebet> = events.iter().filter_map(detect_surebet).collect();
    found.sort_by(|a, b| b.roi.total_cmp(&a.roi));
    found
}
