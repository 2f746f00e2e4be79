//! Simulated odds: NON-AUTHORITATIVE fallback data.
//!
//! Used when no real feed is available. Every generated event carries
//! `simulated = true` and prices carry a normal bookmaker overround; no edge
//! is injected anywhere.

use crate::source::OddsSource;
use crate::{Bookmaker, MatchEvent, Market, QuotedOutcome, H2H_MARKET};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const DEFAULT_BOOKMAKERS: [&str; 5] = ["Betano", "Bet365", "Sportingbet", "Betfair", "Pinnacle"];

#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub home:   String,
    pub away:   String,
    pub league: String,
}

impl Fixture {
    pub fn new(home: &str, away: &str, league: &str) -> Self {
        Self { home: home.to_string(), away: away.to_string(), league: league.to_string() }
    }
}

pub fn default_fixtures() -> Vec<Fixture> {
    vec![
        Fixture::new("Flamengo", "Palmeiras", "Brasileirão Série A"),
        Fixture::new("Corinthians", "São Paulo", "Brasileirão Série A"),
        Fixture::new("Grêmio", "Internacional", "Brasileirão Série A"),
        Fixture::new("Atlético-MG", "Cruzeiro", "Brasileirão Série A"),
        Fixture::new("Manchester City", "Arsenal", "Premier League"),
        Fixture::new("Real Madrid", "Barcelona", "La Liga"),
        Fixture::new("Benfica", "Porto", "Primeira Liga"),
        Fixture::new("Inter", "Milan", "Serie A"),
    ]
}

// ── Display bookmaker selection ──────────────────────────────────────────────

/// Chooses which bookmaker a simulated quote is shown under.
/// Cosmetic only; deterministic for a given list / seed.
pub enum BookmakerSelector {
    RoundRobin { books: Vec<String>, next: usize },
    Seeded { books: Vec<String>, rng: StdRng },
}

impl BookmakerSelector {
    pub fn round_robin(books: Vec<String>) -> Self {
        BookmakerSelector::RoundRobin { books, next: 0 }
    }

    pub fn seeded(books: Vec<String>, seed: u64) -> Self {
        BookmakerSelector::Seeded { books, rng: StdRng::seed_from_u64(seed) }
    }

    /// `None` only when the list is empty.
    pub fn next_bookmaker(&mut self) -> Option<String> {
        match self {
            BookmakerSelector::RoundRobin { books, next } => {
                if books.is_empty() {
                    return None;
                }
                let book = books[*next % books.len()].clone();
                *next = (*next + 1) % books.len();
                Some(book)
            }
            BookmakerSelector::Seeded { books, rng } => {
                if books.is_empty() {
                    return None;
                }
                let i = rng.gen_range(0..books.len());
                Some(books[i].clone())
            }
        }
    }

    /// Up to `n` different bookmakers for one event, never the same one twice.
    pub fn next_distinct(&mut self, n: usize) -> Vec<String> {
        match self {
            BookmakerSelector::RoundRobin { books, next } => {
                if books.is_empty() {
                    return Vec::new();
                }
                let take = n.min(books.len());
                let picked = (0..take).map(|k| books[(*next + k) % books.len()].clone()).collect();
                *next = (*next + take) % books.len();
                picked
            }
            BookmakerSelector::Seeded { books, rng } => {
                books.choose_multiple(rng, n).cloned().collect()
            }
        }
    }
}

// ── Source ───────────────────────────────────────────────────────────────────

pub struct SimulatedSource {
    seed:         u64,
    fixtures:     Vec<Fixture>,
    bookmakers:   Vec<String>,
    books_per_ev: usize,
}

impl SimulatedSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            fixtures:     default_fixtures(),
            bookmakers:   DEFAULT_BOOKMAKERS.iter().map(|b| b.to_string()).collect(),
            books_per_ev: 2,
        }
    }

    pub fn with_fixtures(mut self, fixtures: Vec<Fixture>) -> Self {
        self.fixtures = fixtures;
        self
    }

    /// Repeated titles are dropped; an event never lists one bookmaker twice.
    pub fn with_bookmakers(mut self, bookmakers: Vec<String>, per_event: usize) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(bookmakers.len());
        for title in bookmakers {
            if !unique.contains(&title) {
                unique.push(title);
            }
        }
        self.bookmakers = unique;
        self.books_per_ev = per_event.max(1);
        self
    }

    fn quote(rng: &mut StdRng, probs: [f64; 3], margin: f64) -> [f64; 3] {
        probs.map(|p| {
            // +-3 % noise per book, 2 decimals, never below 1.01
            let jitter = rng.gen_range(0.97..1.03);
            let price = (1.0 / (p * margin)) * jitter;
            ((price * 100.0).round() / 100.0).max(1.01)
        })
    }
}

impl OddsSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    fn fetch_events(&self) -> Result<Vec<MatchEvent>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut selector = BookmakerSelector::seeded(self.bookmakers.clone(), self.seed);

        let events = self
            .fixtures
            .iter()
            .enumerate()
            .map(|(i, fx)| {
                let home = rng.gen_range(0.25..0.60);
                let draw = rng.gen_range(0.22..0.30);
                let probs = [home, draw, (1.0_f64 - home - draw).max(0.05)];
                let total: f64 = probs.iter().sum();
                let probs = probs.map(|p| p / total);
                let margin = rng.gen_range(1.04..1.08);

                let bookmakers = selector
                    .next_distinct(self.books_per_ev)
                    .into_iter()
                    .map(|title| {
                        let [h, d, a] = Self::quote(&mut rng, probs, margin);
                        Bookmaker {
                            key:     title.to_lowercase(),
                            title,
                            markets: vec![Market {
                                key:      H2H_MARKET.to_string(),
                                outcomes: vec![
                                    QuotedOutcome { name: fx.home.clone(), price: h },
                                    QuotedOutcome { name: "Draw".to_string(), price: d },
                                    QuotedOutcome { name: fx.away.clone(), price: a },
                                ],
                            }],
                        }
                    })
                    .collect();

                MatchEvent {
                    id:            format!("sim-{}-{}", self.seed, i),
                    home_team:     fx.home.clone(),
                    away_team:     fx.away.clone(),
                    league:        fx.league.clone(),
                    commence_time: None,
                    bookmakers,
                    simulated:     true,
                }
            })
            .collect();

        Ok(events)
    }
}
