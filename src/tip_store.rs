use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use tip_board::rows::{INDIVIDUALS_TABLE, MULTIPLES_TABLE, SUREBETS_TABLE};
use tip_board::{IndividualRow, MultipleRow, SurebetRow, TableSink};

/// SQLite result store. Every write replaces the whole table:
/// old rows are deleted and the new batch inserted in one transaction.
pub struct TipStore {
    conn: Connection,
}

impl TipStore {
    pub fn open(path: &str) -> Result<Self> {
        let db_path = Path::new(path);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("open sqlite db at {path}"))?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().context("open in-memory db")?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn count(&self, table: &str) -> Result<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(1) FROM {table}"), [], |r| r.get(0))
            .with_context(|| format!("count {table}"))
    }

    pub fn individuals(&self) -> Result<Vec<IndividualRow>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT event_id, "match", league, bet_type, probabilidade, odd, casa_aposta,
                      value_expected, stake, confidence, simulated
               FROM individuais ORDER BY id"#,
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(IndividualRow {
                    event_id:       r.get(0)?,
                    match_name:     r.get(1)?,
                    league:         r.get(2)?,
                    bet_type:       r.get(3)?,
                    probabilidade:  r.get(4)?,
                    odd:            r.get(5)?,
                    casa_aposta:    r.get(6)?,
                    value_expected: r.get(7)?,
                    stake:          r.get(8)?,
                    confidence:     r.get(9)?,
                    simulated:      r.get::<_, i64>(10)? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read individuais")?;
        Ok(rows)
    }

    fn replace<T>(
        &mut self,
        table:  &str,
        rows:   &[T],
        insert: impl Fn(&Transaction<'_>, &str, &T) -> rusqlite::Result<usize>,
    ) -> Result<usize> {
        let ts = Utc::now().to_rfc3339();
        let tx = self.conn.transaction().with_context(|| format!("begin replace {table}"))?;
        tx.execute(&format!("DELETE FROM {table}"), [])
            .with_context(|| format!("clear {table}"))?;
        for row in rows {
            insert(&tx, &ts, row).with_context(|| format!("insert into {table}"))?;
        }
        tx.commit().with_context(|| format!("commit {table}"))?;
        Ok(rows.len())
    }
}

impl TableSink for TipStore {
    fn replace_individuals(&mut self, rows: &[IndividualRow]) -> Result<usize> {
        self.replace(INDIVIDUALS_TABLE, rows, |tx, ts, r| {
            tx.execute(
                r#"
                INSERT INTO individuais(ts, event_id, "match", league, bet_type, probabilidade, odd,
                                        casa_aposta, value_expected, stake, confidence, simulated)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    ts,
                    r.event_id,
                    r.match_name,
                    r.league,
                    r.bet_type,
                    r.probabilidade,
                    r.odd,
                    r.casa_aposta,
                    r.value_expected,
                    r.stake,
                    r.confidence,
                    if r.simulated { 1 } else { 0 },
                ],
            )
        })
    }

    fn replace_multiples(&mut self, rows: &[MultipleRow]) -> Result<usize> {
        self.replace(MULTIPLES_TABLE, rows, |tx, ts, r| {
            tx.execute(
                "INSERT INTO multiplas(ts, odd_total, probabilidade, valor_esperado, confianca, jogos, simulated) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![ts, r.odd_total, r.probabilidade, r.valor_esperado, r.confianca, r.jogos, if r.simulated { 1 } else { 0 }],
            )
        })
    }

    fn replace_surebets(&mut self, rows: &[SurebetRow]) -> Result<usize> {
        self.replace(SUREBETS_TABLE, rows, |tx, ts, r| {
            tx.execute(
                r#"INSERT INTO surebets(ts, event_id, "match", league, margin, roi, legs, simulated) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                params![ts, r.event_id, r.match_name, r.league, r.margin, r.roi, r.legs, if r.simulated { 1 } else { 0 }],
            )
        })
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS individuais (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ts TEXT NOT NULL,
            event_id TEXT NOT NULL,
            "match" TEXT NOT NULL,
            league TEXT NOT NULL,
            bet_type TEXT NOT NULL,
            probabilidade REAL NOT NULL,
            odd REAL NOT NULL,
            casa_aposta TEXT NOT NULL,
            value_expected REAL NOT NULL,
            stake TEXT NOT NULL,
            confidence TEXT NOT NULL,
            simulated INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ind_value ON individuais(value_expected);

        CREATE TABLE IF NOT EXISTS multiplas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ts TEXT NOT NULL,
            odd_total REAL NOT NULL,
            probabilidade REAL NOT NULL,
            valor_esperado REAL NOT NULL,
            confianca TEXT NOT NULL,
            jogos TEXT NOT NULL,
            simulated INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS surebets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ts TEXT NOT NULL,
            event_id TEXT NOT NULL,
            "match" TEXT NOT NULL,
            league TEXT NOT NULL,
            margin REAL NOT NULL,
            roi REAL NOT NULL,
            legs TEXT NOT NULL,
            simulated INTEGER NOT NULL
        );
        "#,
    ).context("init schema")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(event_id: &str, ev: f64) -> IndividualRow {
        IndividualRow {
            event_id:       event_id.to_string(),
            match_name:     "Flamengo x Palmeiras".to_string(),
            league:         "Brasileirão Série A".to_string(),
            bet_type:       "Flamengo Vence".to_string(),
            probabilidade:  0.48,
            odd:            2.3,
            casa_aposta:    "Betano".to_string(),
            value_expected: ev,
            stake:          "LOW".to_string(),
            confidence:     "LOW".to_string(),
            simulated:      true,
        }
    }

    #[test]
    fn replace_keeps_only_latest_batch() {
        let mut store = TipStore::open_in_memory().unwrap();

        store.replace_individuals(&[row("a", 0.05), row("b", 0.07)]).unwrap();
        assert_eq!(store.count(INDIVIDUALS_TABLE).unwrap(), 2);

        store.replace_individuals(&[row("c", 0.10)]).unwrap();
        let stored = store.individuals().unwrap();
        assert_eq!(stored, vec![row("c", 0.10)]);

        assert_eq!(store.replace_individuals(&[]).unwrap(), 0);
        assert_eq!(store.count(INDIVIDUALS_TABLE).unwrap(), 0);
    }

    #[test]
    fn sample_dump_end_to_end() {
        use odds_feed::{JsonFileSource, OddsSource};
        use tip_board::{Board, BoardConfig};
        use value_engine::ValuationEngine;

        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/odds_sample.json");
        let events = JsonFileSource::new(path).fetch_events().unwrap();
        assert_eq!(events.len(), 4);

        let board = Board::build(&events, &ValuationEngine::new(), &BoardConfig::default()).unwrap();
        let mut store = TipStore::open_in_memory().unwrap();
        board.publish(&mut store).unwrap();

        // Grêmio x Internacional and Man City x Arsenal price under 100 %
        assert_eq!(store.count(INDIVIDUALS_TABLE).unwrap(), 2);
        assert_eq!(store.count(MULTIPLES_TABLE).unwrap(), 1);
        // Flamengo x Palmeiras across Betano / Bet365
        assert_eq!(store.count(SUREBETS_TABLE).unwrap(), 1);

        let stored = store.individuals().unwrap();
        assert_eq!(stored[0].event_id, "epl-2026-08-mci-ars");
        assert!(stored.iter().all(|r| r.value_expected > 0.0 && !r.simulated));
    }

    #[test]
    fn simulated_flag_survives_every_table() {
        use odds_feed::{JsonFileSource, OddsSource};
        use tip_board::{Board, BoardConfig};
        use value_engine::ValuationEngine;

        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/odds_sample.json");
        let mut events = JsonFileSource::new(path).fetch_events().unwrap();
        for ev in &mut events {
            ev.simulated = true;
        }

        let board = Board::build(&events, &ValuationEngine::new(), &BoardConfig::default()).unwrap();
        let mut store = TipStore::open_in_memory().unwrap();
        board.publish(&mut store).unwrap();

        for table in [INDIVIDUALS_TABLE, MULTIPLES_TABLE, SUREBETS_TABLE] {
            let (rows, flagged): (i64, i64) = store
                .conn
                .query_row(&format!("SELECT COUNT(1), COALESCE(SUM(simulated), 0) FROM {table}"), [], |r| {
                    Ok((r.get(0)?, r.get(1)?))
                })
                .unwrap();
            assert!(rows > 0, "{table} is empty");
            assert_eq!(rows, flagged, "{table} lost the simulated flag");
        }

        // real data stays unflagged
        let real = JsonFileSource::new(path).fetch_events().unwrap();
        Board::build(&real, &ValuationEngine::new(), &BoardConfig::default()).unwrap().publish(&mut store).unwrap();
        let flagged: i64 = store
            .conn
            .query_row("SELECT COUNT(1) FROM surebets WHERE simulated = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(flagged, 0);
    }

    #[test]
    fn tables_are_replaced_independently() {
        let mut store = TipStore::open_in_memory().unwrap();
        store.replace_individuals(&[row("a", 0.05)]).unwrap();

        let multiple = MultipleRow {
            odd_total:      3.78,
            probabilidade:  0.2688,
            valor_esperado: 0.016064,
            confianca:      "LOW".to_string(),
            jogos:          "[]".to_string(),
            simulated:      false,
        };
        store.replace_multiples(&[multiple.clone(), multiple]).unwrap();

        let surebet = SurebetRow {
            event_id:   "arb".to_string(),
            match_name: "Home FC x Away FC".to_string(),
            league:     "Test League".to_string(),
            margin:     0.976,
            roi:        0.0244,
            legs:       "[]".to_string(),
            simulated:  false,
        };
        store.replace_surebets(&[surebet]).unwrap();

        assert_eq!(store.count(INDIVIDUALS_TABLE).unwrap(), 1);
        assert_eq!(store.count(MULTIPLES_TABLE).unwrap(), 2);
        assert_eq!(store.count(SUREBETS_TABLE).unwrap(), 1);

        store.replace_multiples(&[]).unwrap();
        assert_eq!(store.count(MULTIPLES_TABLE).unwrap(), 0);
        assert_eq!(store.count(INDIVIDUALS_TABLE).unwrap(), 1);
    }
}
