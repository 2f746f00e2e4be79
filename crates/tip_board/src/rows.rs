//! Flat table rows. Column names match the tables the frontend reads
//! (`individuais`, `multiplas`, `surebets`).

use crate::surebet::Surebet;
use crate::{BoardAccumulator, ScoredPick};
use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const INDIVIDUALS_TABLE: &str = "individuais";
pub const MULTIPLES_TABLE:   &str = "multiplas";
pub const SUREBETS_TABLE:    &str = "surebets";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRow {
    pub event_id:       String,
    #[serde(rename = "match")]
    pub match_name:     String,
    pub league:         String,
    pub bet_type:       String,
    pub probabilidade:  f64,
    pub odd:            f64,
    pub casa_aposta:    String,
    pub value_expected: f64,
    pub stake:          String,
    pub confidence:     String,
    pub simulated:      bool,
}

impl From<&ScoredPick> for IndividualRow {
    fn from(p: &ScoredPick) -> Self {
        Self {
            event_id:       p.event_id.clone(),
            match_name:     p.match_name.clone(),
            league:         p.league.clone(),
            bet_type:       p.pick.label().to_string(),
            probabilidade:  p.pick.fair_probability(),
            odd:            p.pick.odds(),
            casa_aposta:    p.bookmaker.clone(),
            value_expected: p.pick.expected_value(),
            stake:          p.pick.stake().as_str().to_string(),
            confidence:     p.pick.confidence().as_str().to_string(),
            simulated:      p.simulated,
        }
    }
}

/// One leg inside `multiplas.jogos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegRow {
    #[serde(rename = "match")]
    pub match_name: String,
    pub bet_type:   String,
    pub odd:        f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleRow {
    pub odd_total:      f64,
    pub probabilidade:  f64,
    pub valor_esperado: f64,
    pub confianca:      String,
    /// JSON array of `LegRow`
    pub jogos:          String,
    /// Any leg priced from simulated odds
    pub simulated:      bool,
}

impl MultipleRow {
    pub fn from_accumulator(acc: &BoardAccumulator) -> Result<Self> {
        let legs: Vec<LegRow> = acc
            .legs
            .iter()
            .map(|l| LegRow {
                match_name: l.match_name.clone(),
                bet_type:   l.pick.label().to_string(),
                odd:        l.pick.odds(),
            })
            .collect();

        Ok(Self {
            odd_total:      acc.accumulator.combined_odds(),
            probabilidade:  acc.accumulator.combined_probability(),
            valor_esperado: acc.accumulator.combined_expected_value(),
            confianca:      acc.accumulator.confidence().as_str().to_string(),
            jogos:          serde_json::to_string(&legs)?,
            simulated:      acc.simulated(),
        })
    }

    pub fn legs(&self) -> Result<Vec<LegRow>> {
        Ok(serde_json::from_str(&self.jogos)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurebetRow {
    pub event_id:   String,
    #[serde(rename = "match")]
    pub match_name: String,
    pub league:     String,
    pub margin:     f64,
    pub roi:        f64,
    /// JSON array of legs (label, bookmaker, odds, stake_share)
    pub legs:       String,
    pub simulated:  bool,
}

impl SurebetRow {
    pub fn from_surebet(sb: &Surebet) -> Result<Self> {
        Ok(Self {
            event_id:   sb.event_id.clone(),
            match_name: sb.match_name.clone(),
            league:     sb.league.clone(),
            margin:     sb.margin,
            roi:        sb.roi,
            legs:       serde_json::to_string(&sb.legs)?,
            simulated:  sb.simulated,
        })
    }
}

/// Full replacement batch, one vec per table.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BoardRows {
    pub individuais: Vec<IndividualRow>,
    pub multiplas:   Vec<MultipleRow>,
    pub surebets:    Vec<SurebetRow>,
}
