//! Value Engine: odds → fair probability → expected value → tip
//!
//! Removes the bookmaker overround from a market before computing edge, picks
//! the best outcome and classifies it into confidence / stake tiers.
//! Combines picks into accumulators (múltiplas).
//!
//! Pure and synchronous: no I/O, no shared state, no clock.

pub mod ladder;

pub use ladder::{
    AccumulatorRule, Confidence, Ladders, Stake, TierRule, ACCUMULATOR_LADDER, SINGLE_LADDER,
};

use ladder::{classify_accumulator, classify_single};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// `odds` is `None` when the market has no outcomes at all.
    #[error("Invalid odds: {}", invalid_odds_detail(.label, .odds))]
    InvalidOdds { label: String, odds: Option<f64> },

    #[error("Empty market: no valued outcomes to pick from")]
    EmptyMarket,

    #[error("Insufficient picks: accumulator needs at least 2, got {got}")]
    InsufficientPicks { got: usize },
}

fn invalid_odds_detail(label: &str, odds: &Option<f64>) -> String {
    match odds {
        Some(odds) => format!("'{label}' has odds {odds} (must be finite and > 1.0)"),
        None => "market has no outcomes".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ValueError>;

// ── Types ────────────────────────────────────────────────────────────────────

/// Raw input: one side of a market at a decimal price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub label: String,
    pub odds:  f64,
}

impl Outcome {
    pub fn new(label: impl Into<String>, odds: f64) -> Self {
        Self { label: label.into(), odds }
    }
}

/// Outcome after overround normalization and classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuedOutcome {
    label:               String,
    odds:                f64,
    implied_probability: f64,
    fair_probability:    f64,
    expected_value:      f64,
    confidence:          Confidence,
    stake:               Stake,
}

impl ValuedOutcome {
    pub fn label(&self) -> &str { &self.label }
    pub fn odds(&self) -> f64 { self.odds }
    pub fn implied_probability(&self) -> f64 { self.implied_probability }
    pub fn fair_probability(&self) -> f64 { self.fair_probability }
    pub fn expected_value(&self) -> f64 { self.expected_value }
    pub fn confidence(&self) -> Confidence { self.confidence }
    pub fn stake(&self) -> Stake { self.stake }
}

/// Best outcome of a market, with its position in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pick {
    index:   usize,
    #[serde(flatten)]
    outcome: ValuedOutcome,
}

impl Pick {
    pub fn index(&self) -> usize { self.index }
    pub fn outcome(&self) -> &ValuedOutcome { &self.outcome }
    pub fn label(&self) -> &str { &self.outcome.label }
    pub fn odds(&self) -> f64 { self.outcome.odds }
    pub fn fair_probability(&self) -> f64 { self.outcome.fair_probability }
    pub fn expected_value(&self) -> f64 { self.outcome.expected_value }
    pub fn confidence(&self) -> Confidence { self.outcome.confidence }
    pub fn stake(&self) -> Stake { self.outcome.stake }
}

/// Combined bet. Probability assumes independent legs.
/// No stake tier here, only single markets get one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accumulator {
    picks:                   Vec<Pick>,
    combined_odds:           f64,
    combined_probability:    f64,
    combined_expected_value: f64,
    confidence:              Confidence,
}

impl Accumulator {
    pub fn picks(&self) -> &[Pick] { &self.picks }
    pub fn combined_odds(&self) -> f64 { self.combined_odds }
    pub fn combined_probability(&self) -> f64 { self.combined_probability }
    pub fn combined_expected_value(&self) -> f64 { self.combined_expected_value }
    pub fn confidence(&self) -> Confidence { self.confidence }
}

// ── Arithmetic ───────────────────────────────────────────────────────────────

pub fn implied_probability(odds: f64) -> f64 {
    1.0 / odds
}

/// EV per unit staked if `fair_probability` is the true probability.
pub fn expected_value(odds: f64, fair_probability: f64) -> f64 {
    odds * fair_probability - 1.0
}

fn validate(outcome: &Outcome) -> Result<()> {
    if !outcome.odds.is_finite() || outcome.odds <= 1.0 {
        return Err(ValueError::InvalidOdds {
            label: outcome.label.clone(),
            odds:  Some(outcome.odds),
        });
    }
    Ok(())
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// Engine with tunable ladders. The free functions below use the defaults.
#[derive(Debug, Clone, Default)]
pub struct ValuationEngine {
    ladders: Ladders,
}

impl ValuationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ladders(ladders: Ladders) -> Self {
        Self { ladders }
    }

    pub fn ladders(&self) -> &Ladders {
        &self.ladders
    }

    pub fn value_market(&self, outcomes: &[Outcome]) -> Result<Vec<ValuedOutcome>> {
        value_market_with(&self.ladders.single, outcomes)
    }

    pub fn select_best_pick(&self, valued: &[ValuedOutcome]) -> Result<Pick> {
        select_best_pick(valued)
    }

    pub fn combine_accumulator(&self, picks: &[Pick]) -> Result<Accumulator> {
        combine_accumulator_with(&self.ladders.accumulator, picks)
    }
}

/// Values every outcome of one market. Output order = input order.
pub fn value_market(outcomes: &[Outcome]) -> Result<Vec<ValuedOutcome>> {
    value_market_with(&SINGLE_LADDER, outcomes)
}

fn value_market_with(rules: &[TierRule], outcomes: &[Outcome]) -> Result<Vec<ValuedOutcome>> {
    if outcomes.is_empty() {
        return Err(ValueError::InvalidOdds { label: String::new(), odds: None });
    }
    for o in outcomes {
        validate(o)?;
    }

    let implied: Vec<f64> = outcomes.iter().map(|o| implied_probability(o.odds)).collect();
    let total: f64 = implied.iter().sum();

    Ok(outcomes
        .iter()
        .zip(implied)
        .map(|(o, implied_probability)| {
            let fair_probability = implied_probability / total;
            let expected_value = expected_value(o.odds, fair_probability);
            let (confidence, stake) = classify_single(rules, expected_value, fair_probability);
            ValuedOutcome {
                label: o.label.clone(),
                odds: o.odds,
                implied_probability,
                fair_probability,
                expected_value,
                confidence,
                stake,
            }
        })
        .collect())
}

/// Max EV wins, first index on exact ties. Never filters by EV sign.
pub fn select_best_pick(valued: &[ValuedOutcome]) -> Result<Pick> {
    let mut best: Option<(usize, &ValuedOutcome)> = None;
    for (i, v) in valued.iter().enumerate() {
        match best {
            Some((_, b)) if v.expected_value <= b.expected_value => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(index, v)| Pick { index, outcome: v.clone() })
        .ok_or(ValueError::EmptyMarket)
}

pub fn combine_accumulator(picks: &[Pick]) -> Result<Accumulator> {
    combine_accumulator_with(&ACCUMULATOR_LADDER, picks)
}

fn combine_accumulator_with(rules: &[AccumulatorRule], picks: &[Pick]) -> Result<Accumulator> {
    if picks.len() < 2 {
        return Err(ValueError::InsufficientPicks { got: picks.len() });
    }

    let combined_odds: f64 = picks.iter().map(Pick::odds).product();
    let combined_probability: f64 = picks.iter().map(Pick::fair_probability).product();
    let combined_expected_value = expected_value(combined_odds, combined_probability);

    Ok(Accumulator {
        picks: picks.to_vec(),
        combined_odds,
        combined_probability,
        combined_expected_value,
        confidence: classify_accumulator(rules, combined_expected_value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(prices: &[(&str, f64)]) -> Vec<Outcome> {
        prices.iter().map(|(l, o)| Outcome::new(*l, *o)).collect()
    }

    fn pick(odds: f64, fair_probability: f64) -> Pick {
        Pick {
            index: 0,
            outcome: ValuedOutcome {
                label: "leg".to_string(),
                odds,
                implied_probability: 1.0 / odds,
                fair_probability,
                expected_value: expected_value(odds, fair_probability),
                confidence: Confidence::Low,
                stake: Stake::Low,
            },
        }
    }

    #[test]
    fn fair_probabilities_sum_to_one() {
        let cases: &[&[(&str, f64)]] = &[
            &[("Home", 1.80), ("Draw", 3.40), ("Away", 4.20)],
            &[("Home", 1.01), ("Draw", 21.0), ("Away", 51.0)],
            &[("A", 2.0), ("B", 2.0)],
            &[("Solo", 1.5)],
            &[("Home", 2.75), ("Draw", 3.10), ("Away", 2.60)],
        ];
        for prices in cases {
            let valued = value_market(&market(prices)).unwrap();
            let sum: f64 = valued.iter().map(|v| v.fair_probability()).sum();
            assert!((sum - 1.0).abs() < 1e-9, "sum = {sum} for {prices:?}");
        }
    }

    #[test]
    fn does_not_assume_zero_overround() {
        let valued = value_market(&market(&[("Home", 1.80), ("Draw", 3.40), ("Away", 4.20)])).unwrap();
        let raw: f64 = valued.iter().map(|v| v.implied_probability()).sum();
        assert!(raw > 1.0);
        for v in &valued {
            assert!(v.fair_probability() < v.implied_probability());
        }
    }

    #[test]
    fn concrete_scoring_case() {
        let valued = value_market(&market(&[("Home", 1.80), ("Draw", 3.40), ("Away", 4.20)])).unwrap();

        let labels: Vec<&str> = valued.iter().map(|v| v.label()).collect();
        assert_eq!(labels, vec!["Home", "Draw", "Away"]);

        let fair: Vec<f64> = valued.iter().map(|v| v.fair_probability()).collect();
        assert!((fair[0] - 0.5108).abs() < 1e-3);
        assert!((fair[1] - 0.2704).abs() < 1e-3);
        assert!((fair[2] - 0.2188).abs() < 1e-3);

        for v in &valued {
            assert!((v.expected_value() - (-0.0806)).abs() < 1e-3, "ev = {}", v.expected_value());
            assert_eq!(v.confidence(), Confidence::VeryLow);
            assert_eq!(v.stake(), Stake::None);
        }

        let best = select_best_pick(&valued).unwrap();
        let max_ev = valued.iter().map(|v| v.expected_value()).fold(f64::NEG_INFINITY, f64::max);
        let first_max = valued.iter().position(|v| v.expected_value() == max_ev).unwrap();
        assert_eq!(best.index(), first_max);
        assert_eq!(best.index(), 0);
        assert_eq!(best.label(), "Home");
        assert!((best.expected_value() - valued[0].expected_value()).abs() < 1e-12);
        assert_eq!(best.confidence(), Confidence::VeryLow);
        assert_eq!(best.stake(), Stake::None);
    }

    #[test]
    fn rejects_invalid_odds() {
        let err = value_market(&market(&[("X", 1.0)])).unwrap_err();
        assert_eq!(err, ValueError::InvalidOdds { label: "X".to_string(), odds: Some(1.0) });

        assert!(matches!(value_market(&market(&[("X", 0.5)])), Err(ValueError::InvalidOdds { .. })));
        assert!(matches!(value_market(&market(&[("X", f64::NAN)])), Err(ValueError::InvalidOdds { .. })));
        assert!(matches!(value_market(&market(&[("X", f64::INFINITY)])), Err(ValueError::InvalidOdds { .. })));
        assert!(matches!(
            value_market(&market(&[("Home", 2.0), ("Draw", 1.0), ("Away", 3.0)])),
            Err(ValueError::InvalidOdds { .. })
        ));
        assert_eq!(
            value_market(&[]).unwrap_err(),
            ValueError::InvalidOdds { label: String::new(), odds: None }
        );
    }

    #[test]
    fn invalid_odds_message_names_outcome() {
        let err = value_market(&market(&[("Empate", 0.9)])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid odds: 'Empate' has odds 0.9 (must be finite and > 1.0)");
        assert_eq!(value_market(&[]).unwrap_err().to_string(), "Invalid odds: market has no outcomes");
    }

    #[test]
    fn empty_selection_fails() {
        assert_eq!(select_best_pick(&[]).unwrap_err(), ValueError::EmptyMarket);
    }

    #[test]
    fn best_pick_is_max_ev_first_on_ties() {
        // symmetric market → identical EVs → index 0
        let valued = value_market(&market(&[("A", 2.5), ("B", 2.5), ("C", 2.5)])).unwrap();
        assert_eq!(select_best_pick(&valued).unwrap().index(), 0);

        let valued = value_market(&market(&[("Home", 2.0), ("Draw", 3.5), ("Away", 3.9)])).unwrap();
        let best = select_best_pick(&valued).unwrap();
        for v in &valued {
            assert!(best.expected_value() >= v.expected_value());
        }
    }

    #[test]
    fn selection_does_not_filter_negative_ev() {
        let valued = value_market(&market(&[("Home", 1.30), ("Draw", 5.0), ("Away", 9.0)])).unwrap();
        let best = select_best_pick(&valued).unwrap();
        assert!(best.expected_value() < 0.0);
    }

    #[test]
    fn deterministic_and_idempotent() {
        let input = market(&[("Home", 2.10), ("Draw", 3.30), ("Away", 3.60)]);
        let run = || {
            let valued = value_market(&input).unwrap();
            let best = select_best_pick(&valued).unwrap();
            let acc = combine_accumulator(&[best.clone(), best.clone()]).unwrap();
            (
                serde_json::to_string(&valued).unwrap(),
                serde_json::to_string(&best).unwrap(),
                serde_json::to_string(&acc).unwrap(),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn expected_value_increases_with_odds() {
        let p = 0.42;
        let mut prev = expected_value(1.01, p);
        for step in 1..200 {
            let odds = 1.01 + step as f64 * 0.05;
            let ev = expected_value(odds, p);
            assert!(ev > prev);
            prev = ev;
        }
    }

    #[test]
    fn accumulator_literal_case() {
        let acc = combine_accumulator(&[pick(1.80, 0.56), pick(2.10, 0.48)]).unwrap();
        assert!((acc.combined_odds() - 3.78).abs() < 1e-9);
        assert!((acc.combined_probability() - 0.2688).abs() < 1e-9);
        assert!((acc.combined_expected_value() - 0.016064).abs() < 1e-9);
        assert_eq!(acc.confidence(), Confidence::Low);
        assert_eq!(acc.picks().len(), 2);
        assert_eq!(acc.picks()[0].odds(), 1.80);
    }

    #[test]
    fn accumulator_confidence_ladder() {
        // 2.0 * 0.6 * 2.0 * 0.6 - 1 = 0.44
        let acc = combine_accumulator(&[pick(2.0, 0.6), pick(2.0, 0.6)]).unwrap();
        assert_eq!(acc.confidence(), Confidence::VeryHigh);
        // 2.0 * 0.55 * 2.0 * 0.55 - 1 = 0.21
        let acc = combine_accumulator(&[pick(2.0, 0.55), pick(2.0, 0.55)]).unwrap();
        assert_eq!(acc.confidence(), Confidence::High);
        // 2.0 * 0.53 * 2.0 * 0.53 - 1 = 0.1236
        let acc = combine_accumulator(&[pick(2.0, 0.53), pick(2.0, 0.53)]).unwrap();
        assert_eq!(acc.confidence(), Confidence::Medium);
    }

    #[test]
    fn accumulator_needs_two_picks() {
        assert_eq!(combine_accumulator(&[]).unwrap_err(), ValueError::InsufficientPicks { got: 0 });
        assert_eq!(
            combine_accumulator(&[pick(1.9, 0.5)]).unwrap_err(),
            ValueError::InsufficientPicks { got: 1 }
        );
        assert!(combine_accumulator(&[pick(1.9, 0.5), pick(1.7, 0.6), pick(2.2, 0.45)]).is_ok());
        assert_eq!(
            combine_accumulator(&[]).unwrap_err().to_string(),
            "Insufficient picks: accumulator needs at least 2, got 0"
        );
    }

    #[test]
    fn custom_ladders_change_tiers_not_arithmetic() {
        let strict = Ladders {
            single: vec![TierRule {
                min_ev: 0.50,
                min_probability: None,
                confidence: Confidence::High,
                stake: Stake::Medium,
            }],
            accumulator: vec![],
        };
        let engine = ValuationEngine::with_ladders(strict);
        let input = market(&[("Home", 1.50), ("Draw", 4.50), ("Away", 7.00)]);

        let tuned = engine.value_market(&input).unwrap();
        let default = value_market(&input).unwrap();
        for (t, d) in tuned.iter().zip(&default) {
            assert_eq!(t.expected_value(), d.expected_value());
            assert_eq!(t.fair_probability(), d.fair_probability());
            assert_eq!(t.confidence(), Confidence::VeryLow);
        }

        let acc = engine.combine_accumulator(&[pick(2.0, 0.6), pick(2.0, 0.6)]).unwrap();
        assert_eq!(acc.confidence(), Confidence::Low);
    }

    #[test]
    fn pick_serializes_flat() {
        let valued = value_market(&market(&[("Home", 2.0), ("Away", 2.0)])).unwrap();
        let best = select_best_pick(&valued).unwrap();
        let json: serde_json::Value = serde_json::to_value(&best).unwrap();
        assert_eq!(json["index"], 0);
        assert_eq!(json["label"], "Home");
        assert_eq!(json["confidence"], "VERY_LOW");
        assert_eq!(json["stake"], "NONE");
    }
}
