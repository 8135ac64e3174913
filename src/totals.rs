use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, TotalsBlend, TotalsParams};
use crate::confidence::totals_confidence;
use crate::policy::{EdgeBand, Verdict, pass_reason, totals_tier};
use crate::stats::{TeamSeasonStats, TotalLine};

/// Base total and the five adjustments that feed the blend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TotalsBreakdown {
    pub base_total: f64,
    pub offensive_matchup: f64,
    pub defensive_matchup: f64,
    pub pace: f64,
    pub competitiveness: f64,
    pub rating: f64,
}

pub fn base_total(home: &TeamSeasonStats, away: &TeamSeasonStats) -> f64 {
    let home_expected = (home.points_per_game + away.points_allowed_per_game) / 2.0;
    let away_expected = (away.points_per_game + home.points_allowed_per_game) / 2.0;
    home_expected + away_expected
}

pub fn offensive_matchup(home: &TeamSeasonStats, away: &TeamSeasonStats) -> f64 {
    let off = |t: &TeamSeasonStats| t.offensive_rating.unwrap_or(0.0);
    let def = |t: &TeamSeasonStats| t.defensive_rating.unwrap_or(0.0);
    ((off(home) - def(away)) + (off(away) - def(home))) / 4.0
}

pub fn defensive_matchup(home: &TeamSeasonStats, away: &TeamSeasonStats) -> f64 {
    let avg = (home.defensive_rating.unwrap_or(0.0) + away.defensive_rating.unwrap_or(0.0)) / 2.0;
    -avg * 0.5
}

pub fn pace(home: &TeamSeasonStats, away: &TeamSeasonStats) -> f64 {
    let avg = (home.margin_per_game().abs() + away.margin_per_game().abs()) / 2.0;
    avg / 5.0
}

pub fn competitiveness(home: &TeamSeasonStats, away: &TeamSeasonStats) -> f64 {
    let gap = (home.win_percentage - away.win_percentage).abs();
    if gap < 0.20 {
        -2.5
    } else if gap < 0.40 {
        -1.0
    } else {
        (gap - 0.40) * 10.0
    }
}

pub fn rating_adjustment(home: &TeamSeasonStats, away: &TeamSeasonStats) -> f64 {
    (home.overall_rating() + away.overall_rating()) / 5.0
}

pub fn breakdown(home: &TeamSeasonStats, away: &TeamSeasonStats) -> TotalsBreakdown {
    TotalsBreakdown {
        base_total: base_total(home, away),
        offensive_matchup: offensive_matchup(home, away),
        defensive_matchup: defensive_matchup(home, away),
        pace: pace(home, away),
        competitiveness: competitiveness(home, away),
        rating: rating_adjustment(home, away),
    }
}

/// Weighted sum of the six "base + adjustment" variants, base alone included.
pub fn blend(b: &TotalsBreakdown, w: &TotalsBlend) -> f64 {
    let base = b.base_total;
    base * w.base
        + (base + b.offensive_matchup) * w.offensive
        + (base + b.defensive_matchup) * w.defensive
        + (base + b.pace) * w.pace
        + (base + b.competitiveness) * w.competitiveness
        + (base + b.rating) * w.rating
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TotalSide {
    Over,
    Under,
}

impl TotalSide {
    pub fn as_str(self) -> &'static str {
        match self {
            TotalSide::Over => "OVER",
            TotalSide::Under => "UNDER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalsCall {
    pub verdict: Verdict,
    pub edge: f64,
    pub side: Option<TotalSide>,
}

pub fn band(p: &TotalsParams) -> EdgeBand {
    EdgeBand {
        min: p.edge_min,
        max: p.edge_max,
        min_confidence: p.min_confidence,
    }
}

pub fn recommend(predicted: f64, market_total: f64, confidence: f64, p: &TotalsParams) -> TotalsCall {
    let difference = predicted - market_total;
    let edge = difference.abs();
    let verdict = band(p).judge(edge, confidence);
    let side = verdict.is_recommend().then(|| {
        if difference > 0.0 {
            TotalSide::Over
        } else {
            TotalSide::Under
        }
    });
    TotalsCall {
        verdict,
        edge,
        side,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalsPrediction {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff: Option<DateTime<Utc>>,
    pub bookmaker: String,
    pub predicted_total: f64,
    pub confidence: f64,
    pub market_total: f64,
    pub over_price: f64,
    pub under_price: f64,
    pub recommended_bet: Option<TotalSide>,
    pub verdict: Verdict,
    pub value_score: f64,
    pub reasoning: String,
    pub breakdown: TotalsBreakdown,
}

impl TotalsPrediction {
    pub fn is_recommended(&self) -> bool {
        self.recommended_bet.is_some()
    }
}

pub fn predict_total(
    line: &TotalLine,
    home: &TeamSeasonStats,
    away: &TeamSeasonStats,
    cfg: &ModelConfig,
) -> TotalsPrediction {
    let p = &cfg.totals;
    let parts = breakdown(home, away);
    let predicted = blend(&parts, &p.blend);
    let confidence = totals_confidence(home, away, p).score;
    let market = line.over_line;
    let call = recommend(predicted, market, confidence, p);

    let head = format!("{} ({confidence:.0}%)", totals_tier(confidence));
    let reasoning = match call.side {
        Some(TotalSide::Over) => {
            let mut text = format!(
                "{head}: Model predicts {predicted:.1} points, Vegas line: {market}. Expect {:.1} more points.",
                call.edge
            );
            if parts.offensive_matchup > 2.0 {
                text.push_str(" Strong offensive matchups favor scoring.");
            }
            if parts.pace > 2.0 {
                text.push_str(" High point differentials indicate explosive teams.");
            }
            if parts.competitiveness > 1.0 {
                text.push_str(" Mismatch could lead to blowout scoring.");
            }
            text
        }
        Some(TotalSide::Under) => {
            let mut text = format!(
                "{head}: Model predicts {predicted:.1} points, Vegas line: {market}. Expect {:.1} fewer points.",
                call.edge
            );
            if parts.defensive_matchup < -2.0 {
                text.push_str(" Strong defenses limit scoring.");
            }
            if parts.competitiveness < -2.0 {
                text.push_str(" Evenly matched teams play conservatively.");
            }
            if parts.rating < -1.0 {
                text.push_str(" Both teams below league average quality.");
            }
            text
        }
        None => format!(
            "{head}: {} Model: {predicted:.1}, Vegas: {market}.",
            pass_reason(call.verdict, call.edge, confidence, &band(p))
        ),
    };

    TotalsPrediction {
        game_id: line.game_id.clone(),
        home_team: line.home_team.clone(),
        away_team: line.away_team.clone(),
        kickoff: line.kickoff,
        bookmaker: line.bookmaker.clone(),
        predicted_total: predicted,
        confidence,
        market_total: market,
        over_price: line.over_price,
        under_price: line.under_price,
        recommended_bet: call.side,
        verdict: call.verdict,
        value_score: call.edge,
        reasoning,
        breakdown: parts,
    }
}
