//! Batch evaluation of a slate: look up the inputs for each line, run the
//! predictor, and collect predictions and skips in input order.

use std::collections::{BTreeMap, HashSet};
use std::env;

use rayon::prelude::*;

use crate::config::ModelConfig;
use crate::error::Skip;
use crate::props::{self, PropMarket, PropRecommendation};
use crate::spread::{self, SpreadPrediction};
use crate::stats::{
    DefenseGroup, OpponentDefenseRow, PlayerSeasonRow, PropLine, SpreadLine, TeamSeasonStats,
    TotalLine,
};
use crate::totals::{self, TotalsPrediction};

/// Read side of whatever holds the season data.
pub trait StatsSource: Sync {
    fn team_stats(&self, team: &str) -> Option<&TeamSeasonStats>;
    fn player(&self, name: &str) -> Option<&PlayerSeasonRow>;
    fn defense(&self, team: &str, group: DefenseGroup) -> Option<&OpponentDefenseRow>;
}

pub trait Pick {
    fn is_pick(&self) -> bool;
}

impl Pick for SpreadPrediction {
    fn is_pick(&self) -> bool {
        self.is_recommended()
    }
}

impl Pick for TotalsPrediction {
    fn is_pick(&self) -> bool {
        self.is_recommended()
    }
}

impl Pick for PropRecommendation {
    fn is_pick(&self) -> bool {
        self.is_recommended()
    }
}

fn teams_for<'a, S: StatsSource + ?Sized>(
    src: &'a S,
    home: &str,
    away: &str,
) -> Result<(&'a TeamSeasonStats, &'a TeamSeasonStats), Skip> {
    let home_stats = src
        .team_stats(home)
        .ok_or_else(|| Skip::MissingTeamStats(home.to_string()))?;
    let away_stats = src
        .team_stats(away)
        .ok_or_else(|| Skip::MissingTeamStats(away.to_string()))?;
    Ok((home_stats, away_stats))
}

pub fn predict_spread_line<S: StatsSource + ?Sized>(
    src: &S,
    line: &SpreadLine,
    cfg: &ModelConfig,
) -> Result<SpreadPrediction, Skip> {
    let (home, away) = teams_for(src, &line.home_team, &line.away_team)?;
    Ok(spread::predict_spread(line, home, away, cfg))
}

pub fn predict_total_line<S: StatsSource + ?Sized>(
    src: &S,
    line: &TotalLine,
    cfg: &ModelConfig,
) -> Result<TotalsPrediction, Skip> {
    let (home, away) = teams_for(src, &line.home_team, &line.away_team)?;
    Ok(totals::predict_total(line, home, away, cfg))
}

pub fn predict_prop_line<S: StatsSource + ?Sized>(
    src: &S,
    line: &PropLine,
    cfg: &ModelConfig,
) -> Result<PropRecommendation, Skip> {
    let market =
        PropMarket::from_key(&line.market).ok_or_else(|| Skip::UnknownMarket(line.market.clone()))?;
    let player = src
        .player(&line.player_name)
        .ok_or_else(|| Skip::MissingPlayer(line.player_name.clone()))?;
    if !props::is_eligible(market, player.position) {
        return Err(Skip::IneligibleMarket {
            player: player.player_name.clone(),
            position: player.position.label().to_string(),
            market: market.key().to_string(),
        });
    }
    let opponent = props::opponent_for(&player.team, &line.home_team, &line.away_team).ok_or_else(
        || Skip::PlayerNotInGame {
            player: player.player_name.clone(),
            team: player.team.clone(),
            home: line.home_team.clone(),
            away: line.away_team.clone(),
        },
    )?;
    let line_value = match (line.line, market) {
        (Some(v), _) if v.is_finite() => v,
        (_, PropMarket::AnytimeTd) => cfg.props.anytime_td_default_line,
        _ => {
            return Err(Skip::MissingLine(format!(
                "{} {}",
                line.player_name,
                market.key()
            )));
        }
    };
    let defense = player
        .position
        .defense_group()
        .and_then(|group| src.defense(opponent, group));
    Ok(props::predict_prop(
        line, market, line_value, player, opponent, defense, cfg,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub parallel: bool,
    pub threads: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: 4,
        }
    }
}

impl RunOptions {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            threads: 1,
        }
    }

    /// `GRIDIRON_PARALLEL` (default on) and `GRIDIRON_THREADS` (2..=32, default 4).
    pub fn from_env() -> Self {
        let parallel = env::var("GRIDIRON_PARALLEL")
            .ok()
            .map(|v| parse_flag(&v))
            .unwrap_or(true);
        let threads = env::var("GRIDIRON_THREADS")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(2, 32);
        Self { parallel, threads }
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn with_pool<T>(opts: &RunOptions, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(opts.threads.max(1))
        .build()
    {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}

#[derive(Debug, Clone)]
pub struct SlateRun<T> {
    pub predictions: Vec<T>,
    pub skipped: Vec<(String, Skip)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub evaluated: usize,
    pub recommended: usize,
    pub skipped: usize,
    pub skipped_by_kind: BTreeMap<&'static str, usize>,
}

impl<T: Pick> SlateRun<T> {
    pub fn summary(&self) -> RunSummary {
        let mut skipped_by_kind = BTreeMap::new();
        for (_, skip) in &self.skipped {
            *skipped_by_kind.entry(skip.kind()).or_insert(0) += 1;
        }
        RunSummary {
            evaluated: self.predictions.len(),
            recommended: self.predictions.iter().filter(|p| p.is_pick()).count(),
            skipped: self.skipped.len(),
            skipped_by_kind,
        }
    }

    pub fn picks(&self) -> impl Iterator<Item = &T> {
        self.predictions.iter().filter(|p| p.is_pick())
    }
}

fn run_lines<L, T>(
    label: &str,
    lines: &[L],
    opts: &RunOptions,
    id: impl Fn(&L) -> String + Sync,
    eval: impl Fn(&L) -> Result<T, Skip> + Sync,
) -> SlateRun<T>
where
    L: Sync,
    T: Send + Pick,
{
    let results: Vec<(String, Result<T, Skip>)> = if opts.parallel && lines.len() > 1 {
        with_pool(opts, || {
            lines
                .par_iter()
                .map(|line| (id(line), eval(line)))
                .collect()
        })
    } else {
        lines.iter().map(|line| (id(line), eval(line))).collect()
    };

    let mut predictions = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (key, result) in results {
        match result {
            Ok(pred) => {
                tracing::debug!(run = label, id = %key, pick = pred.is_pick(), "evaluated");
                predictions.push(pred);
            }
            Err(skip) => {
                tracing::warn!(run = label, id = %key, reason = %skip, "skipped");
                skipped.push((key, skip));
            }
        }
    }

    let run = SlateRun {
        predictions,
        skipped,
    };
    let summary = run.summary();
    tracing::info!(
        run = label,
        lines = lines.len(),
        evaluated = summary.evaluated,
        recommended = summary.recommended,
        skipped = summary.skipped,
        "run complete"
    );
    run
}

pub fn run_spreads<S: StatsSource + ?Sized>(
    src: &S,
    lines: &[SpreadLine],
    cfg: &ModelConfig,
    opts: &RunOptions,
) -> SlateRun<SpreadPrediction> {
    run_lines(
        "spreads",
        lines,
        opts,
        |l| l.game_id.clone(),
        |l| predict_spread_line(src, l, cfg),
    )
}

/// Runs totals after keeping only the first quoted line per game.
pub fn run_totals<S: StatsSource + ?Sized>(
    src: &S,
    lines: &[TotalLine],
    cfg: &ModelConfig,
    opts: &RunOptions,
) -> SlateRun<TotalsPrediction> {
    let lines = dedupe_total_lines(lines);
    run_lines(
        "totals",
        &lines,
        opts,
        |l| l.game_id.clone(),
        |l| predict_total_line(src, l, cfg),
    )
}

pub fn run_props<S: StatsSource + ?Sized>(
    src: &S,
    lines: &[PropLine],
    cfg: &ModelConfig,
    opts: &RunOptions,
) -> SlateRun<PropRecommendation> {
    run_lines(
        "props",
        lines,
        opts,
        |l| format!("{}:{}:{}", l.event_id, l.player_name, l.market),
        |l| predict_prop_line(src, l, cfg),
    )
}

pub fn dedupe_total_lines(lines: &[TotalLine]) -> Vec<TotalLine> {
    let mut seen = HashSet::new();
    lines
        .iter()
        .filter(|l| seen.insert(l.game_id.as_str()))
        .cloned()
        .collect()
}

/// Recommended spreads, most confident first.
pub fn best_spread_bets(preds: &[SpreadPrediction], limit: usize) -> Vec<&SpreadPrediction> {
    let mut picks: Vec<&SpreadPrediction> = preds.iter().filter(|p| p.is_recommended()).collect();
    picks.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then(b.value_score.total_cmp(&a.value_score))
    });
    picks.truncate(limit);
    picks
}

/// Recommended totals, largest value score first.
pub fn best_totals_bets(preds: &[TotalsPrediction], limit: usize) -> Vec<&TotalsPrediction> {
    let mut picks: Vec<&TotalsPrediction> = preds.iter().filter(|p| p.is_recommended()).collect();
    picks.sort_by(|a, b| {
        b.value_score
            .total_cmp(&a.value_score)
            .then(b.confidence.total_cmp(&a.confidence))
    });
    picks.truncate(limit);
    picks
}

/// Recommended props, largest probability edge first.
pub fn best_props(recs: &[PropRecommendation], limit: usize) -> Vec<&PropRecommendation> {
    let mut picks: Vec<&PropRecommendation> = recs.iter().filter(|r| r.is_recommended()).collect();
    picks.sort_by(|a, b| {
        b.edge
            .total_cmp(&a.edge)
            .then(b.expected_value.total_cmp(&a.expected_value))
    });
    picks.truncate(limit);
    picks
}
