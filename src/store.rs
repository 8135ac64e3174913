use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, Transaction, params};

use crate::props::PropRecommendation;
use crate::spread::SpreadPrediction;
use crate::totals::TotalsPrediction;

/// `GRIDIRON_DB_PATH` when set, else nothing; the binary only persists when asked to.
pub fn db_path_from_env() -> Option<PathBuf> {
    std::env::var("GRIDIRON_DB_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS spread_predictions (
            game_id TEXT NOT NULL,
            week_number INTEGER NOT NULL,
            season INTEGER NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            kickoff TEXT NULL,
            predicted_winner TEXT NOT NULL,
            predicted_spread REAL NOT NULL,
            confidence_score REAL NOT NULL,
            market_spread REAL NOT NULL,
            home_moneyline TEXT NULL,
            away_moneyline TEXT NULL,
            home_team_strength REAL NOT NULL,
            away_team_strength REAL NOT NULL,
            recommended_bet TEXT NOT NULL,
            value_score REAL NOT NULL,
            reasoning TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (game_id, week_number, season)
        );

        CREATE TABLE IF NOT EXISTS totals_predictions (
            game_id TEXT NOT NULL,
            week_number INTEGER NOT NULL,
            season INTEGER NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            kickoff TEXT NULL,
            bookmaker TEXT NOT NULL,
            predicted_total REAL NOT NULL,
            confidence_score REAL NOT NULL,
            vegas_total REAL NOT NULL,
            over_price REAL NOT NULL,
            under_price REAL NOT NULL,
            recommended_bet TEXT NULL,
            value_score REAL NOT NULL,
            reasoning TEXT NOT NULL,
            breakdown_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (game_id, week_number, season)
        );

        CREATE TABLE IF NOT EXISTS prop_recommendations (
            event_id TEXT NOT NULL,
            player_name TEXT NOT NULL,
            market TEXT NOT NULL,
            bookmaker TEXT NOT NULL,
            week_number INTEGER NOT NULL,
            season INTEGER NOT NULL,
            team TEXT NOT NULL,
            opponent TEXT NOT NULL,
            position TEXT NOT NULL,
            line REAL NOT NULL,
            over_odds REAL NULL,
            under_odds REAL NULL,
            side TEXT NOT NULL,
            probability REAL NOT NULL,
            edge REAL NOT NULL,
            expected_value REAL NOT NULL,
            model_mean REAL NOT NULL,
            model_stdev REAL NOT NULL,
            implied_probability REAL NOT NULL,
            confidence_score REAL NOT NULL,
            reasoning TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (event_id, player_name, market, bookmaker, week_number, season)
        );
        CREATE INDEX IF NOT EXISTS idx_spread_week ON spread_predictions(season, week_number);
        CREATE INDEX IF NOT EXISTS idx_totals_week ON totals_predictions(season, week_number);
        CREATE INDEX IF NOT EXISTS idx_props_week ON prop_recommendations(season, week_number);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn save_spread_predictions(
    conn: &mut Connection,
    preds: &[SpreadPrediction],
    week: u32,
    season: u32,
) -> Result<usize> {
    let tx = conn.transaction().context("begin spread transaction")?;
    for pred in preds {
        upsert_spread(&tx, pred, week, season)?;
    }
    tx.commit().context("commit spread transaction")?;
    tracing::info!(rows = preds.len(), week, season, "saved spread predictions");
    Ok(preds.len())
}

fn upsert_spread(tx: &Transaction<'_>, p: &SpreadPrediction, week: u32, season: u32) -> Result<()> {
    let reasoning = if p.reasoning.is_empty() {
        "No significant value detected"
    } else {
        p.reasoning.as_str()
    };
    tx.execute(
        r#"
        INSERT INTO spread_predictions (
            game_id, week_number, season, home_team, away_team, kickoff,
            predicted_winner, predicted_spread, confidence_score, market_spread,
            home_moneyline, away_moneyline, home_team_strength, away_team_strength,
            recommended_bet, value_score, reasoning, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        ON CONFLICT(game_id, week_number, season) DO UPDATE SET
            home_team = excluded.home_team,
            away_team = excluded.away_team,
            kickoff = excluded.kickoff,
            predicted_winner = excluded.predicted_winner,
            predicted_spread = excluded.predicted_spread,
            confidence_score = excluded.confidence_score,
            market_spread = excluded.market_spread,
            home_moneyline = excluded.home_moneyline,
            away_moneyline = excluded.away_moneyline,
            home_team_strength = excluded.home_team_strength,
            away_team_strength = excluded.away_team_strength,
            recommended_bet = excluded.recommended_bet,
            value_score = excluded.value_score,
            reasoning = excluded.reasoning,
            updated_at = excluded.updated_at
        "#,
        params![
            p.game_id,
            week as i64,
            season as i64,
            p.home_team,
            p.away_team,
            p.kickoff.map(|t| t.to_rfc3339()),
            p.predicted_winner,
            p.predicted_margin,
            p.confidence,
            p.market_spread,
            p.home_moneyline,
            p.away_moneyline,
            p.home_strength,
            p.away_strength,
            p.bet_token.as_str(),
            p.value_score,
            reasoning,
            Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("upsert spread prediction {}", p.game_id))?;
    Ok(())
}

pub fn save_totals_predictions(
    conn: &mut Connection,
    preds: &[TotalsPrediction],
    week: u32,
    season: u32,
) -> Result<usize> {
    let tx = conn.transaction().context("begin totals transaction")?;
    for pred in preds {
        upsert_total(&tx, pred, week, season)?;
    }
    tx.commit().context("commit totals transaction")?;
    tracing::info!(rows = preds.len(), week, season, "saved totals predictions");
    Ok(preds.len())
}

fn upsert_total(tx: &Transaction<'_>, p: &TotalsPrediction, week: u32, season: u32) -> Result<()> {
    let breakdown = serde_json::to_string(&p.breakdown).context("serialize totals breakdown")?;
    tx.execute(
        r#"
        INSERT INTO totals_predictions (
            game_id, week_number, season, home_team, away_team, kickoff, bookmaker,
            predicted_total, confidence_score, vegas_total, over_price, under_price,
            recommended_bet, value_score, reasoning, breakdown_json, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        ON CONFLICT(game_id, week_number, season) DO UPDATE SET
            home_team = excluded.home_team,
            away_team = excluded.away_team,
            kickoff = excluded.kickoff,
            bookmaker = excluded.bookmaker,
            predicted_total = excluded.predicted_total,
            confidence_score = excluded.confidence_score,
            vegas_total = excluded.vegas_total,
            over_price = excluded.over_price,
            under_price = excluded.under_price,
            recommended_bet = excluded.recommended_bet,
            value_score = excluded.value_score,
            reasoning = excluded.reasoning,
            breakdown_json = excluded.breakdown_json,
            updated_at = excluded.updated_at
        "#,
        params![
            p.game_id,
            week as i64,
            season as i64,
            p.home_team,
            p.away_team,
            p.kickoff.map(|t| t.to_rfc3339()),
            p.bookmaker,
            p.predicted_total,
            p.confidence,
            p.market_total,
            p.over_price,
            p.under_price,
            p.recommended_bet.map(|s| s.as_str()),
            p.value_score,
            p.reasoning,
            breakdown,
            Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("upsert totals prediction {}", p.game_id))?;
    Ok(())
}

pub fn save_prop_recommendations(
    conn: &mut Connection,
    recs: &[PropRecommendation],
    week: u32,
    season: u32,
) -> Result<usize> {
    let tx = conn.transaction().context("begin props transaction")?;
    for rec in recs {
        upsert_prop(&tx, rec, week, season)?;
    }
    tx.commit().context("commit props transaction")?;
    tracing::info!(rows = recs.len(), week, season, "saved prop recommendations");
    Ok(recs.len())
}

fn upsert_prop(tx: &Transaction<'_>, r: &PropRecommendation, week: u32, season: u32) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO prop_recommendations (
            event_id, player_name, market, bookmaker, week_number, season,
            team, opponent, position, line, over_odds, under_odds, side,
            probability, edge, expected_value, model_mean, model_stdev,
            implied_probability, confidence_score, reasoning, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
        ON CONFLICT(event_id, player_name, market, bookmaker, week_number, season) DO UPDATE SET
            team = excluded.team,
            opponent = excluded.opponent,
            position = excluded.position,
            line = excluded.line,
            over_odds = excluded.over_odds,
            under_odds = excluded.under_odds,
            side = excluded.side,
            probability = excluded.probability,
            edge = excluded.edge,
            expected_value = excluded.expected_value,
            model_mean = excluded.model_mean,
            model_stdev = excluded.model_stdev,
            implied_probability = excluded.implied_probability,
            confidence_score = excluded.confidence_score,
            reasoning = excluded.reasoning,
            updated_at = excluded.updated_at
        "#,
        params![
            r.event_id,
            r.player_name,
            r.market.key(),
            r.bookmaker,
            week as i64,
            season as i64,
            r.team,
            r.opponent,
            r.position.label(),
            r.line,
            r.over_odds,
            r.under_odds,
            r.side.as_str(),
            r.probability,
            r.edge,
            r.expected_value,
            r.model_mean,
            r.model_stdev,
            r.implied_probability,
            r.confidence,
            r.reasoning,
            Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("upsert prop {} {}", r.player_name, r.market.key()))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct StoredSpreadBet {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub predicted_winner: String,
    pub predicted_spread: f64,
    pub confidence: f64,
    pub market_spread: f64,
    pub recommended_bet: String,
    pub value_score: f64,
    pub reasoning: String,
}

/// Recommended spread rows for a week, most confident first.
pub fn load_best_spread_bets(
    conn: &Connection,
    week: u32,
    season: u32,
    limit: usize,
) -> Result<Vec<StoredSpreadBet>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                game_id, home_team, away_team, predicted_winner, predicted_spread,
                confidence_score, market_spread, recommended_bet, value_score, reasoning
            FROM spread_predictions
            WHERE week_number = ?1 AND season = ?2 AND recommended_bet != 'none'
            ORDER BY confidence_score DESC, value_score DESC
            LIMIT ?3
            "#,
        )
        .context("prepare best spread query")?;
    let rows = stmt
        .query_map(params![week as i64, season as i64, limit as i64], |row| {
            Ok(StoredSpreadBet {
                game_id: row.get(0)?,
                home_team: row.get(1)?,
                away_team: row.get(2)?,
                predicted_winner: row.get(3)?,
                predicted_spread: row.get(4)?,
                confidence: row.get(5)?,
                market_spread: row.get(6)?,
                recommended_bet: row.get(7)?,
                value_score: row.get(8)?,
                reasoning: row.get(9)?,
            })
        })
        .context("query best spreads")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("read spread row")?);
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct StoredTotalsBet {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub predicted_total: f64,
    pub vegas_total: f64,
    pub confidence: f64,
    pub recommended_bet: String,
    pub value_score: f64,
    pub reasoning: String,
}

/// Recommended totals rows for a week, largest value score first.
pub fn load_best_totals_bets(
    conn: &Connection,
    week: u32,
    season: u32,
    limit: usize,
) -> Result<Vec<StoredTotalsBet>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                game_id, home_team, away_team, predicted_total, vegas_total,
                confidence_score, recommended_bet, value_score, reasoning
            FROM totals_predictions
            WHERE week_number = ?1 AND season = ?2 AND recommended_bet IS NOT NULL
            ORDER BY value_score DESC, confidence_score DESC
            LIMIT ?3
            "#,
        )
        .context("prepare best totals query")?;
    let rows = stmt
        .query_map(params![week as i64, season as i64, limit as i64], |row| {
            Ok(StoredTotalsBet {
                game_id: row.get(0)?,
                home_team: row.get(1)?,
                away_team: row.get(2)?,
                predicted_total: row.get(3)?,
                vegas_total: row.get(4)?,
                confidence: row.get(5)?,
                recommended_bet: row.get(6)?,
                value_score: row.get(7)?,
                reasoning: row.get(8)?,
            })
        })
        .context("query best totals")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("read totals row")?);
    }
    Ok(out)
}
