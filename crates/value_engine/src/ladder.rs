//! Confidence / stake ladders
//!
//! Heuristic business rules, not statistically derived. Rules are evaluated
//! top-down, first match wins, every comparison is strict (`>`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::VeryHigh => "VERY_HIGH",
            Confidence::High     => "HIGH",
            Confidence::Medium   => "MEDIUM",
            Confidence::Low      => "LOW",
            Confidence::VeryLow  => "VERY_LOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stake {
    High,
    Medium,
    Low,
    None,
}

impl Stake {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stake::High   => "HIGH",
            Stake::Medium => "MEDIUM",
            Stake::Low    => "LOW",
            Stake::None   => "NONE",
        }
    }
}

/// One row of the single-market ladder.
/// `min_probability = None` → rule ignores probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRule {
    pub min_ev:          f64,
    pub min_probability: Option<f64>,
    pub confidence:      Confidence,
    pub stake:           Stake,
}

impl TierRule {
    fn matches(&self, ev: f64, probability: f64) -> bool {
        ev > self.min_ev && self.min_probability.map_or(true, |p| probability > p)
    }
}

/// One row of the accumulator ladder (no stake output).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorRule {
    pub min_ev:     f64,
    pub confidence: Confidence,
}

// ── Default breakpoints ──────────────────────────────────────────────────────

pub const SINGLE_LADDER: [TierRule; 4] = [
    TierRule { min_ev: 0.15, min_probability: Some(0.60), confidence: Confidence::VeryHigh, stake: Stake::High },
    TierRule { min_ev: 0.10, min_probability: Some(0.55), confidence: Confidence::High,     stake: Stake::High },
    TierRule { min_ev: 0.05, min_probability: Some(0.50), confidence: Confidence::Medium,   stake: Stake::Medium },
    TierRule { min_ev: 0.00, min_probability: None,       confidence: Confidence::Low,      stake: Stake::Low },
];

pub const SINGLE_FALLBACK: (Confidence, Stake) = (Confidence::VeryLow, Stake::None);

pub const ACCUMULATOR_LADDER: [AccumulatorRule; 3] = [
    AccumulatorRule { min_ev: 0.25, confidence: Confidence::VeryHigh },
    AccumulatorRule { min_ev: 0.15, confidence: Confidence::High },
    AccumulatorRule { min_ev: 0.08, confidence: Confidence::Medium },
];

pub const ACCUMULATOR_FALLBACK: Confidence = Confidence::Low;

/// Tunable ladder set. `Default` carries the literal breakpoints above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ladders {
    pub single:      Vec<TierRule>,
    pub accumulator: Vec<AccumulatorRule>,
}

impl Default for Ladders {
    fn default() -> Self {
        Self {
            single:      SINGLE_LADDER.to_vec(),
            accumulator: ACCUMULATOR_LADDER.to_vec(),
        }
    }
}

pub(crate) fn classify_single(rules: &[TierRule], ev: f64, probability: f64) -> (Confidence, Stake) {
    rules
        .iter()
        .find(|r| r.matches(ev, probability))
        .map(|r| (r.confidence, r.stake))
        .unwrap_or(SINGLE_FALLBACK)
}

pub(crate) fn classify_accumulator(rules: &[AccumulatorRule], ev: f64) -> Confidence {
    rules
        .iter()
        .find(|r| ev > r.min_ev)
        .map(|r| r.confidence)
        .unwrap_or(ACCUMULATOR_FALLBACK)
}
