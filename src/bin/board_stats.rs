use anyhow::{Context, Result};
use rusqlite::Connection;

fn main() -> Result<()> {
    let db_path = std::env::var("TIPS_DB_PATH").unwrap_or_else(|_| "data/tips.db".to_string());
    let conn = Connection::open(&db_path).with_context(|| format!("open db at {db_path}"))?;

    let tables = ["individuais", "multiplas", "surebets"];

    println!("db_path={db_path}");
    for t in tables {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(1) FROM {t}"), [], |r| r.get(0))
            .with_context(|| format!("count {t}"))?;
        println!("{t}: {count}");
    }

    let mut stmt = conn
        .prepare(
            r#"SELECT "match", bet_type, odd, probabilidade, value_expected, confidence, stake, simulated
               FROM individuais ORDER BY value_expected DESC LIMIT 5"#,
        )
        .context("prepare top individuais")?;

    let top = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, f64>(2)?,
                r.get::<_, f64>(3)?,
                r.get::<_, f64>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, String>(6)?,
                r.get::<_, i64>(7)? != 0,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read top individuais")?;

    if top.is_empty() {
        println!("top: <none>");
    }
    for (i, (m, bet, odd, prob, ev, conf, stake, sim)) in top.iter().enumerate() {
        let tag = if *sim { " [SIMULATED]" } else { "" };
        println!(
            "#{} {m} | {bet} @ {odd:.2} | p={prob:.3} ev={ev:+.3} | {conf}/{stake}{tag}",
            i + 1
        );
    }

    let mut stmt = conn
        .prepare("SELECT odd_total, valor_esperado, confianca, jogos, simulated FROM multiplas ORDER BY valor_esperado DESC")
        .context("prepare multiplas")?;
    let multiples = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, f64>(0)?,
                r.get::<_, f64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, i64>(4)? != 0,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read multiplas")?;

    for (odd, ev, conf, jogos, sim) in multiples {
        let tag = if sim { " [SIMULATED]" } else { "" };
        println!("multipla @ {odd:.2} ev={ev:+.3} {conf} ({}){tag}", describe_legs(&jogos));
    }

    Ok(())
}

/// Leg count of a `jogos` column, or the parse error when it is malformed.
fn describe_legs(jogos: &str) -> String {
    match serde_json::from_str::<Vec<serde_json::Value>>(jogos) {
        Ok(legs) => format!("{} legs", legs.len()),
        Err(e)   => format!("bad jogos: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leg_count_or_parse_error() {
        assert_eq!(describe_legs(r#"[{"match":"A x B"},{"match":"C x D"}]"#), "2 legs");
        assert_eq!(describe_legs("[]"), "0 legs");

        let bad = describe_legs("{not json");
        assert!(bad.starts_with("bad jogos: "), "{bad}");
    }
}
