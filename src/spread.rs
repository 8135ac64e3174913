//! Point-spread margin, side selection and the moneyline override.
//!
//! Sign convention: a positive margin means the home side wins by that many
//! points. Market spreads are quoted from the home side, so a home spread of
//! -6.5 implies a home margin of +6.5.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, SpreadParams};
use crate::confidence::spread_confidence;
use crate::normalize::parse_market_number;
use crate::policy::{EdgeBand, TOLERANCE, Verdict, at_least, pass_reason, spread_tier};
use crate::stats::{SpreadLine, TeamSeasonStats};
use crate::strength::team_strength;
use crate::teams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// Compact bet label written next to each stored prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetToken {
    HomeSpread,
    AwaySpread,
    HomeMl,
    AwayMl,
    None,
}

impl BetToken {
    pub fn as_str(self) -> &'static str {
        match self {
            BetToken::HomeSpread => "home_spread",
            BetToken::AwaySpread => "away_spread",
            BetToken::HomeMl => "home_ml",
            BetToken::AwayMl => "away_ml",
            BetToken::None => "none",
        }
    }

    pub fn spread(side: Side) -> Self {
        match side {
            Side::Home => BetToken::HomeSpread,
            Side::Away => BetToken::AwaySpread,
        }
    }

    pub fn moneyline(side: Side) -> Self {
        match side {
            Side::Home => BetToken::HomeMl,
            Side::Away => BetToken::AwayMl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginEstimate {
    pub margin: f64,
    pub winner: Side,
    pub division_game: bool,
}

/// Rating differential, dampened, plus home field; division games shrink toward zero.
pub fn predict_margin(
    home: &TeamSeasonStats,
    away: &TeamSeasonStats,
    division_game: bool,
    p: &SpreadParams,
) -> MarginEstimate {
    let differential = (home.combined_rating() - away.combined_rating()) * p.rating_dampening;
    let mut margin = differential + p.home_field_advantage;
    if division_game {
        margin *= p.division_dampening;
    }
    MarginEstimate {
        margin,
        winner: if margin > 0.0 { Side::Home } else { Side::Away },
        division_game,
    }
}

/// Points between the model margin and the margin the market implies.
pub fn spread_edge(predicted_margin: f64, market_spread: f64) -> f64 {
    (predicted_margin - (-market_spread)).abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideCase {
    /// Model and market agree on the favorite; model expects a bigger win.
    FavoriteCovers,
    /// Model and market agree on the favorite; model expects a smaller win.
    UnderdogValue,
    /// Model and market pick different winners.
    Disagree,
}

pub fn select_side(predicted_margin: f64, market_spread: f64) -> (Side, SideCase) {
    let market_margin = -market_spread;
    if predicted_margin > 0.0 && market_margin > 0.0 {
        if predicted_margin > market_margin {
            (Side::Home, SideCase::FavoriteCovers)
        } else {
            (Side::Away, SideCase::UnderdogValue)
        }
    } else if predicted_margin < 0.0 && market_margin < 0.0 {
        if predicted_margin.abs() > market_margin.abs() {
            (Side::Away, SideCase::FavoriteCovers)
        } else {
            (Side::Home, SideCase::UnderdogValue)
        }
    } else if predicted_margin > 0.0 {
        (Side::Home, SideCase::Disagree)
    } else {
        (Side::Away, SideCase::Disagree)
    }
}

/// Close market, confident model, clear winner: take the moneyline instead of points.
pub fn moneyline_override(
    predicted_margin: f64,
    market_spread: f64,
    confidence: f64,
    p: &SpreadParams,
) -> Option<Side> {
    let close_market = market_spread.abs() <= p.moneyline_max_market_spread + TOLERANCE;
    if at_least(confidence, p.moneyline_min_confidence)
        && close_market
        && at_least(predicted_margin.abs(), p.moneyline_min_margin)
    {
        Some(if predicted_margin > 0.0 {
            Side::Home
        } else {
            Side::Away
        })
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadCall {
    pub verdict: Verdict,
    pub edge: f64,
    pub token: BetToken,
    pub case: Option<SideCase>,
}

pub fn band(p: &SpreadParams) -> EdgeBand {
    EdgeBand {
        min: p.edge_min,
        max: p.edge_max,
        min_confidence: p.min_confidence,
    }
}

/// Policy decision for one game given the model margin, the market spread and a confidence.
pub fn recommend(
    predicted_margin: f64,
    market_spread: f64,
    confidence: f64,
    p: &SpreadParams,
) -> SpreadCall {
    let edge = spread_edge(predicted_margin, market_spread);
    let verdict = band(p).judge(edge, confidence);
    if !verdict.is_recommend() {
        return SpreadCall {
            verdict,
            edge,
            token: BetToken::None,
            case: None,
        };
    }
    if let Some(side) = moneyline_override(predicted_margin, market_spread, confidence, p) {
        return SpreadCall {
            verdict,
            edge,
            token: BetToken::moneyline(side),
            case: None,
        };
    }
    let (side, case) = select_side(predicted_margin, market_spread);
    SpreadCall {
        verdict,
        edge,
        token: BetToken::spread(side),
        case: Some(case),
    }
}

/// Home-style quote for a side's number: "-3", "+3", "PK".
pub fn spread_label(spread: f64) -> String {
    if spread.abs() < TOLERANCE {
        "PK".to_string()
    } else if spread > 0.0 {
        format!("+{spread}")
    } else {
        format!("{spread}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadPrediction {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff: Option<DateTime<Utc>>,
    pub predicted_winner: String,
    pub predicted_margin: f64,
    pub confidence: f64,
    pub market_spread: f64,
    pub home_moneyline: Option<String>,
    pub away_moneyline: Option<String>,
    pub home_strength: f64,
    pub away_strength: f64,
    pub division_game: bool,
    pub recommended_bet: Option<String>,
    pub bet_token: BetToken,
    pub verdict: Verdict,
    pub value_score: f64,
    pub reasoning: String,
}

impl SpreadPrediction {
    pub fn is_recommended(&self) -> bool {
        self.bet_token != BetToken::None
    }
}

pub fn predict_spread(
    line: &SpreadLine,
    home: &TeamSeasonStats,
    away: &TeamSeasonStats,
    cfg: &ModelConfig,
) -> SpreadPrediction {
    let p = &cfg.spread;
    let home_strength = team_strength(home, true, &cfg.strength);
    let away_strength = team_strength(away, false, &cfg.strength);

    let division_game = teams::are_division_rivals(&line.home_team, &line.away_team);
    let estimate = predict_margin(home, away, division_game, p);
    let margin = estimate.margin;
    let market_spread = parse_market_number(line.home_spread.as_deref());
    let confidence = spread_confidence(home, away, home_strength.score, away_strength.score, p).score;

    let call = recommend(margin, market_spread, confidence, p);
    let team_of = |side: Side| match side {
        Side::Home => line.home_team.as_str(),
        Side::Away => line.away_team.as_str(),
    };
    let spread_of = |side: Side| {
        let (quoted, implied) = match side {
            Side::Home => (line.home_spread.as_deref(), market_spread),
            Side::Away => (line.away_spread.as_deref(), -market_spread),
        };
        match quoted.map(str::trim).filter(|s| !s.is_empty()) {
            Some(quoted) => quoted.to_string(),
            None => spread_label(implied),
        }
    };
    let winner = team_of(estimate.winner);
    let tier = spread_tier(confidence);
    let head = format!("{tier} ({confidence:.0}%)");
    let market_margin = -market_spread;

    let (recommended_bet, mut reasoning) = match (call.token, call.case) {
        (BetToken::HomeMl | BetToken::AwayMl, _) => (
            Some(format!("{winner} Moneyline")),
            format!(
                "{head}: Close spread ({market_spread}), high confidence. Take {winner} ML for cleaner win."
            ),
        ),
        (BetToken::HomeSpread | BetToken::AwaySpread, Some(case)) => {
            let side = if call.token == BetToken::HomeSpread {
                Side::Home
            } else {
                Side::Away
            };
            let pick = format!("{} {}", team_of(side), spread_of(side));
            let text = match case {
                SideCase::FavoriteCovers => format!(
                    "{head}: Model predicts {} by {:.1}, Vegas: {:.1}. {:.1}pt edge.",
                    team_of(side),
                    margin.abs(),
                    market_margin.abs(),
                    call.edge
                ),
                SideCase::UnderdogValue => format!(
                    "{head}: {} (underdog) loses by less. Model: {:.1}, Vegas: {:.1}. {:.1}pt value.",
                    team_of(side),
                    margin.abs(),
                    market_margin.abs(),
                    call.edge
                ),
                SideCase::Disagree => {
                    let other = match side {
                        Side::Home => Side::Away,
                        Side::Away => Side::Home,
                    };
                    format!(
                        "{head}: Model picks {}, Vegas favors {}.",
                        team_of(side),
                        team_of(other)
                    )
                }
            };
            (Some(pick), text)
        }
        _ => (
            None,
            format!(
                "{head}: {}",
                pass_reason(call.verdict, call.edge, confidence, &band(p))
            ),
        ),
    };

    for (team, strength) in [(&line.home_team, &home_strength), (&line.away_team, &away_strength)] {
        if !strength.injury_details.is_empty() {
            reasoning.push_str(&format!("\n\n{team} Injuries:\n"));
            reasoning.push_str(&strength.injury_details.join("\n"));
        }
    }

    SpreadPrediction {
        game_id: line.game_id.clone(),
        home_team: line.home_team.clone(),
        away_team: line.away_team.clone(),
        kickoff: line.kickoff,
        predicted_winner: winner.to_string(),
        predicted_margin: margin,
        confidence,
        market_spread,
        home_moneyline: line.home_price.clone(),
        away_moneyline: line.away_price.clone(),
        home_strength: home_strength.score,
        away_strength: away_strength.score,
        division_game,
        recommended_bet,
        bet_token: call.token,
        verdict: call.verdict,
        value_score: call.edge,
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated(off: f64, def: f64) -> TeamSeasonStats {
        TeamSeasonStats {
            offensive_rating: Some(off),
            defensive_rating: Some(def),
            ..Default::default()
        }
    }

    #[test]
    fn margin_is_dampened_differential_plus_home_field() {
        let p = SpreadParams::default();
        let est = predict_margin(&rated(4.0, 2.0), &rated(0.0, 0.0), false, &p);
        assert!((est.margin - (6.0 * 0.85 + 2.5)).abs() < 1e-9);
        assert_eq!(est.winner, Side::Home);

        let div = predict_margin(&rated(4.0, 2.0), &rated(0.0, 0.0), true, &p);
        assert!((div.margin - est.margin * 0.9).abs() < 1e-9);
    }

    #[test]
    fn zero_margin_goes_to_away_side() {
        let p = SpreadParams {
            home_field_advantage: 0.0,
            ..Default::default()
        };
        let est = predict_margin(&rated(1.0, 1.0), &rated(1.0, 1.0), false, &p);
        assert_eq!(est.margin, 0.0);
        assert_eq!(est.winner, Side::Away);
    }

    #[test]
    fn missing_away_quote_is_derived_from_home_spread() {
        assert_eq!(spread_label(-3.0), "-3");
        assert_eq!(spread_label(6.5), "+6.5");
        assert_eq!(spread_label(0.0), "PK");

        let mut cfg = ModelConfig::default();
        cfg.spread.min_confidence = 0.0;
        let line = SpreadLine {
            game_id: "g".to_string(),
            home_team: "Dallas Cowboys".to_string(),
            away_team: "Seattle Seahawks".to_string(),
            kickoff: None,
            home_spread: Some("-3".to_string()),
            away_spread: None,
            home_price: None,
            away_price: None,
        };
        let pred = predict_spread(&line, &rated(0.0, 0.0), &rated(4.0, 4.0), &cfg);
        assert_eq!(pred.bet_token, BetToken::AwaySpread);
        assert_eq!(pred.recommended_bet.as_deref(), Some("Seattle Seahawks +3"));
    }

    #[test]
    fn side_selection_cases() {
        // both favor home, model bigger
        assert_eq!(select_side(9.3, -6.5), (Side::Home, SideCase::FavoriteCovers));
        // both favor home, model smaller
        assert_eq!(select_side(3.0, -6.5), (Side::Away, SideCase::UnderdogValue));
        // both favor away
        assert_eq!(select_side(-10.0, 6.5), (Side::Away, SideCase::FavoriteCovers));
        assert_eq!(select_side(-3.0, 6.5), (Side::Home, SideCase::UnderdogValue));
        // disagreement and pick'em follow the model
        assert_eq!(select_side(3.0, 2.5), (Side::Home, SideCase::Disagree));
        assert_eq!(select_side(-3.0, 0.0), (Side::Away, SideCase::Disagree));
    }

    #[test]
    fn moneyline_override_needs_all_three_conditions() {
        let p = SpreadParams::default();
        assert_eq!(moneyline_override(6.0, -1.5, 90.0, &p), Some(Side::Home));
        assert_eq!(moneyline_override(-5.0, 2.0, 85.0, &p), Some(Side::Away));
        assert_eq!(moneyline_override(6.0, -2.5, 90.0, &p), None);
        assert_eq!(moneyline_override(4.9, -1.5, 90.0, &p), None);
        assert_eq!(moneyline_override(6.0, -1.5, 84.9, &p), None);
    }

    #[test]
    fn recommend_gates_before_picking() {
        let p = SpreadParams::default();
        let call = recommend(9.3, -6.5, 65.0, &p);
        assert!((call.edge - 2.8).abs() < 1e-9);
        assert_eq!(call.token, BetToken::HomeSpread);

        let pass = recommend(9.3, -6.5, 60.0, &p);
        assert_eq!(pass.verdict, Verdict::LowConfidence);
        assert_eq!(pass.token, BetToken::None);

        let wild = recommend(12.0, -3.0, 95.0, &p);
        assert_eq!(wild.verdict, Verdict::Unrealistic);
        assert_eq!(wild.token, BetToken::None);

        let ml = recommend(5.5, -1.0, 90.0, &p);
        assert_eq!(ml.token, BetToken::HomeMl);
    }

    #[test]
    fn malformed_spread_is_a_pickem() {
        let line = SpreadLine {
            game_id: "g1".to_string(),
            home_team: "Buffalo Bills".to_string(),
            away_team: "Dallas Cowboys".to_string(),
            kickoff: None,
            home_spread: Some("n/a".to_string()),
            away_spread: None,
            home_price: None,
            away_price: None,
        };
        let pred = predict_spread(&line, &rated(3.0, 1.0), &rated(1.0, 0.0), &ModelConfig::default());
        assert_eq!(pred.market_spread, 0.0);
        assert!((pred.value_score - pred.predicted_margin.abs()).abs() < 1e-9);
        assert!(!pred.division_game);
        assert_eq!(pred.predicted_winner, "Buffalo Bills");
    }

    #[test]
    fn injuries_are_listed_in_reasoning() {
        let line = SpreadLine {
            game_id: "g2".to_string(),
            home_team: "Kansas City Chiefs".to_string(),
            away_team: "Denver Broncos".to_string(),
            kickoff: None,
            home_spread: Some("-3".to_string()),
            away_spread: Some("+3".to_string()),
            home_price: Some("-150".to_string()),
            away_price: Some("+130".to_string()),
        };
        let mut home = rated(3.0, 1.0);
        home.injuries.push(crate::stats::InjuredPlayer {
            name: "Starter".to_string(),
            position: "WR".to_string(),
            snap_share: Some(90.0),
        });
        let pred = predict_spread(&line, &home, &rated(1.0, 0.0), &ModelConfig::default());
        assert!(pred.division_game);
        assert!(pred.reasoning.contains("Kansas City Chiefs Injuries:"));
        assert!(!pred.reasoning.contains("Denver Broncos Injuries:"));
        assert_eq!(pred.home_moneyline.as_deref(), Some("-150"));
    }
}
