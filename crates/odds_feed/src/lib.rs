//! TipsLive: Odds Feed
//!
//! Provider-shaped match/odds records and the caller-side checks that turn
//! them into well-formed 1X2 markets for the value engine:
//!   - `resolve_h2h`  → one price per outcome (first valid bookmaker wins)
//!   - `best_prices`  → best price per outcome across bookmakers (surebets)
//!
//! Fetching lives behind `OddsSource` (see `source`, `simulated`).

pub mod simulated;
pub mod source;

pub use simulated::{BookmakerSelector, Fixture, SimulatedSource};
pub use source::{FallbackSource, FetchedEvents, JsonFileSource, OddsSource};

use serde::{Deserialize, Serialize};
use tracing::debug;
use value_engine::Outcome;

pub const H2H_MARKET: &str = "h2h";

// ── Provider records ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub id:            String,
    pub home_team:     String,
    pub away_team:     String,
    #[serde(default, alias = "sport_title")]
    pub league:        String,
    #[serde(default)]
    pub commence_time: Option<String>,
    #[serde(default)]
    pub bookmakers:    Vec<Bookmaker>,
    /// Generated by `SimulatedSource`; never authoritative.
    #[serde(default)]
    pub simulated:     bool,
}

impl MatchEvent {
    pub fn match_name(&self) -> String {
        format!("{} x {}", self.home_team, self.away_team)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmaker {
    #[serde(default)]
    pub key:     String,
    pub title:   String,
    #[serde(default)]
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub key:      String,
    #[serde(default)]
    pub outcomes: Vec<QuotedOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedOutcome {
    pub name:  String,
    pub price: f64,
}

// ── 1X2 resolution ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Draw,
    Away,
}

impl Side {
    pub const ALL: [Side; 3] = [Side::Home, Side::Draw, Side::Away];

    pub fn label(&self, event: &MatchEvent) -> String {
        match self {
            Side::Home => format!("{} Vence", event.home_team),
            Side::Draw => "Empate".to_string(),
            Side::Away => format!("{} Vence", event.away_team),
        }
    }

    fn matches(&self, event: &MatchEvent, name: &str) -> bool {
        let name = name.trim();
        match self {
            Side::Home => name.eq_ignore_ascii_case(event.home_team.trim()),
            Side::Away => name.eq_ignore_ascii_case(event.away_team.trim()),
            Side::Draw => ["draw", "empate", "x"].iter().any(|d| name.eq_ignore_ascii_case(d)),
        }
    }
}

/// One market, one price per outcome, ready for `value_market`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMarket {
    pub bookmaker: String,
    pub outcomes:  Vec<Outcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestPrice {
    pub side:      Side,
    pub label:     String,
    pub bookmaker: String,
    pub odds:      f64,
}

fn usable(price: f64) -> bool {
    price.is_finite() && price > 1.0
}

/// Home/draw/away prices of one bookmaker, if it quotes a complete h2h market.
fn h2h_prices(event: &MatchEvent, bookmaker: &Bookmaker) -> Option<[f64; 3]> {
    let market = bookmaker.markets.iter().find(|m| m.key == H2H_MARKET)?;
    let mut prices = [0.0; 3];
    for (slot, side) in prices.iter_mut().zip(Side::ALL) {
        let mut quotes = market.outcomes.iter().filter(|o| side.matches(event, &o.name));
        let quote = quotes.next()?;
        if quotes.next().is_some() || !usable(quote.price) {
            return None;
        }
        *slot = quote.price;
    }
    Some(prices)
}

/// First bookmaker with a complete, valid 1X2 market. `None` → skip the event.
pub fn resolve_h2h(event: &MatchEvent) -> Option<ResolvedMarket> {
    for bookmaker in &event.bookmakers {
        match h2h_prices(event, bookmaker) {
            Some(prices) => {
                let outcomes = Side::ALL
                    .iter()
                    .zip(prices)
                    .map(|(side, price)| Outcome::new(side.label(event), price))
                    .collect();
                return Some(ResolvedMarket { bookmaker: bookmaker.title.clone(), outcomes });
            }
            None => debug!(
                event = %event.id,
                bookmaker = %bookmaker.title,
                "incomplete h2h market, trying next bookmaker"
            ),
        }
    }
    None
}

/// Highest price per outcome across all bookmakers with a complete 1X2 market.
/// Ties keep the earlier bookmaker.
pub fn best_prices(event: &MatchEvent) -> Option<Vec<BestPrice>> {
    let mut best: Option<Vec<BestPrice>> = None;

    for bookmaker in &event.bookmakers {
        let Some(prices) = h2h_prices(event, bookmaker) else { continue };
        let current = best.get_or_insert_with(|| {
            Side::ALL
                .iter()
                .zip(prices)
                .map(|(side, odds)| BestPrice {
                    side:      *side,
                    label:     side.label(event),
                    bookmaker: bookmaker.title.clone(),
                    odds,
                })
                .collect()
        });
        for (slot, price) in current.iter_mut().zip(prices) {
            if price > slot.odds {
                slot.odds = price;
                slot.bookmaker = bookmaker.title.clone();
            }
        }
    }

    best
}
