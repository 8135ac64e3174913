//! Player prop projection.
//!
//! A player's per-game average (or a league constant when there is nothing usable)
//! is nudged toward what the opponent allows to that position group, turned into
//! P(Over) with a fixed per-market spread, and compared against both sides'
//! implied probabilities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, PropParams};
use crate::confidence::prop_confidence;
use crate::odds::{american_to_implied, expected_value, prob_over};
use crate::policy::{at_least, prop_tier};
use crate::stats::{DefenseGroup, OpponentDefenseRow, PlayerSeasonRow, PropLine, Position, StatTable};
use crate::teams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropMarket {
    #[serde(rename = "player_pass_yds")]
    PassYds,
    #[serde(rename = "player_pass_tds")]
    PassTds,
    #[serde(rename = "player_pass_completions")]
    PassCompletions,
    #[serde(rename = "player_pass_attempts")]
    PassAttempts,
    #[serde(rename = "player_rush_yds")]
    RushYds,
    #[serde(rename = "player_rush_attempts")]
    RushAttempts,
    #[serde(rename = "player_reception_yds")]
    ReceptionYds,
    #[serde(rename = "player_receptions")]
    Receptions,
    #[serde(rename = "player_anytime_td")]
    AnytimeTd,
}

impl PropMarket {
    pub const ALL: [PropMarket; 9] = [
        PropMarket::PassYds,
        PropMarket::PassTds,
        PropMarket::PassCompletions,
        PropMarket::PassAttempts,
        PropMarket::RushYds,
        PropMarket::RushAttempts,
        PropMarket::ReceptionYds,
        PropMarket::Receptions,
        PropMarket::AnytimeTd,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PropMarket::PassYds => "player_pass_yds",
            PropMarket::PassTds => "player_pass_tds",
            PropMarket::PassCompletions => "player_pass_completions",
            PropMarket::PassAttempts => "player_pass_attempts",
            PropMarket::RushYds => "player_rush_yds",
            PropMarket::RushAttempts => "player_rush_attempts",
            PropMarket::ReceptionYds => "player_reception_yds",
            PropMarket::Receptions => "player_receptions",
            PropMarket::AnytimeTd => "player_anytime_td",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|m| m.key().eq_ignore_ascii_case(raw))
    }

    pub fn label(self) -> &'static str {
        match self {
            PropMarket::PassYds => "pass yds",
            PropMarket::PassTds => "pass TDs",
            PropMarket::PassCompletions => "completions",
            PropMarket::PassAttempts => "pass attempts",
            PropMarket::RushYds => "rush yds",
            PropMarket::RushAttempts => "rush attempts",
            PropMarket::ReceptionYds => "rec yds",
            PropMarket::Receptions => "receptions",
            PropMarket::AnytimeTd => "anytime TD",
        }
    }
}

const QB_MARKETS: &[PropMarket] = &[
    PropMarket::PassYds,
    PropMarket::PassTds,
    PropMarket::PassCompletions,
    PropMarket::PassAttempts,
];
const RB_MARKETS: &[PropMarket] = &[
    PropMarket::RushYds,
    PropMarket::RushAttempts,
    PropMarket::ReceptionYds,
    PropMarket::Receptions,
    PropMarket::AnytimeTd,
];
const PASS_CATCHER_MARKETS: &[PropMarket] = &[
    PropMarket::ReceptionYds,
    PropMarket::Receptions,
    PropMarket::AnytimeTd,
];

pub fn eligible_markets(position: Position) -> &'static [PropMarket] {
    match position {
        Position::Qb => QB_MARKETS,
        Position::Rb | Position::Fb => RB_MARKETS,
        Position::Wr | Position::Te => PASS_CATCHER_MARKETS,
        Position::Other => &[],
    }
}

pub fn is_eligible(market: PropMarket, position: Position) -> bool {
    eligible_markets(position).contains(&market)
}

type PlayerStat = fn(&PlayerSeasonRow) -> Option<f64>;

fn passing(row: &PlayerSeasonRow) -> Option<&crate::stats::PassingLine> {
    match &row.stats {
        StatTable::Passing(line) => Some(line),
        _ => None,
    }
}

fn rushing(row: &PlayerSeasonRow) -> Option<&crate::stats::RushingLine> {
    match &row.stats {
        StatTable::Rushing(line) => Some(line),
        _ => None,
    }
}

fn receiving(row: &PlayerSeasonRow) -> Option<&crate::stats::ReceivingLine> {
    match &row.stats {
        StatTable::Receiving(line) => Some(line),
        _ => None,
    }
}

fn sum_present(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

/// Season-total column behind each (market, position) pair.
const STAT_MAP: &[(PropMarket, Position, PlayerStat)] = &[
    (PropMarket::PassYds, Position::Qb, |r| passing(r)?.passing_yards),
    (PropMarket::PassTds, Position::Qb, |r| passing(r)?.passing_tds),
    (PropMarket::PassCompletions, Position::Qb, |r| passing(r)?.completions),
    (PropMarket::PassAttempts, Position::Qb, |r| passing(r)?.attempts),
    (PropMarket::RushYds, Position::Rb, |r| rushing(r)?.rushing_yards),
    (PropMarket::RushAttempts, Position::Rb, |r| rushing(r)?.rushing_attempts),
    (PropMarket::ReceptionYds, Position::Rb, |r| rushing(r)?.receiving_yards),
    (PropMarket::Receptions, Position::Rb, |r| rushing(r)?.receptions),
    (PropMarket::AnytimeTd, Position::Rb, rushing_back_tds),
    (PropMarket::RushYds, Position::Fb, |r| rushing(r)?.rushing_yards),
    (PropMarket::RushAttempts, Position::Fb, |r| rushing(r)?.rushing_attempts),
    (PropMarket::ReceptionYds, Position::Fb, |r| rushing(r)?.receiving_yards),
    (PropMarket::Receptions, Position::Fb, |r| rushing(r)?.receptions),
    (PropMarket::AnytimeTd, Position::Fb, rushing_back_tds),
    (PropMarket::ReceptionYds, Position::Wr, |r| receiving(r)?.receiving_yards),
    (PropMarket::Receptions, Position::Wr, |r| receiving(r)?.receptions),
    (PropMarket::AnytimeTd, Position::Wr, pass_catcher_tds),
    (PropMarket::ReceptionYds, Position::Te, |r| receiving(r)?.receiving_yards),
    (PropMarket::Receptions, Position::Te, |r| receiving(r)?.receptions),
    (PropMarket::AnytimeTd, Position::Te, pass_catcher_tds),
];

fn rushing_back_tds(row: &PlayerSeasonRow) -> Option<f64> {
    row.total_tds.or_else(|| {
        let line = rushing(row)?;
        sum_present(line.rushing_tds, line.receiving_tds)
    })
}

fn pass_catcher_tds(row: &PlayerSeasonRow) -> Option<f64> {
    row.total_tds.or_else(|| receiving(row)?.receiving_tds)
}

pub fn stat_accessor(market: PropMarket, position: Position) -> Option<PlayerStat> {
    STAT_MAP
        .iter()
        .find(|(m, p, _)| *m == market && *p == position)
        .map(|(_, _, f)| *f)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: f64,
    pub from_player: bool,
}

/// Per-game average from the player's own table, else the league constant for the market.
pub fn baseline_mean(row: Option<&PlayerSeasonRow>, market: PropMarket, p: &PropParams) -> Baseline {
    let from_row = row.and_then(|row| {
        if row.games_played == 0 {
            return None;
        }
        let total = stat_accessor(market, row.position)?(row)?;
        total
            .is_finite()
            .then(|| total / row.games_played as f64)
    });
    match from_row {
        Some(mean) => Baseline {
            mean,
            from_player: true,
        },
        None => Baseline {
            mean: p.prior(market).league_mean,
            from_player: false,
        },
    }
}

type DefenseStat = fn(&OpponentDefenseRow) -> Option<f64>;

/// League-average per-game amount a defense gives up, with the column it is compared to.
const LEAGUE_ALLOWED: &[(PropMarket, DefenseGroup, f64, DefenseStat)] = &[
    (PropMarket::PassYds, DefenseGroup::VsQb, 220.0, |d| d.pass_yds),
    (PropMarket::PassTds, DefenseGroup::VsQb, 1.6, |d| d.pass_tds),
    (PropMarket::PassCompletions, DefenseGroup::VsQb, 22.0, |d| d.pass_cmp),
    (PropMarket::PassAttempts, DefenseGroup::VsQb, 35.0, |d| d.pass_att),
    (PropMarket::RushYds, DefenseGroup::VsRb, 115.0, |d| d.rush_yds),
    // carries allowed are not tracked; estimated at 4.0 yards per carry
    (PropMarket::RushAttempts, DefenseGroup::VsRb, 28.0, |d| d.rush_yds.map(|y| y / 4.0)),
    (PropMarket::ReceptionYds, DefenseGroup::VsRb, 40.0, |d| d.rec_yds),
    (PropMarket::AnytimeTd, DefenseGroup::VsRb, 1.0, |d| sum_present(d.rush_tds, d.rec_tds)),
    (PropMarket::ReceptionYds, DefenseGroup::VsWr, 190.0, |d| d.rec_yds),
    (PropMarket::Receptions, DefenseGroup::VsWr, 17.0, |d| d.receptions),
    (PropMarket::AnytimeTd, DefenseGroup::VsWr, 1.2, |d| d.rec_tds),
    (PropMarket::ReceptionYds, DefenseGroup::VsTe, 55.0, |d| d.rec_yds),
    (PropMarket::Receptions, DefenseGroup::VsTe, 5.5, |d| d.receptions),
    (PropMarket::AnytimeTd, DefenseGroup::VsTe, 0.5, |d| d.rec_tds),
];

pub fn league_allowed(market: PropMarket, group: DefenseGroup) -> Option<(f64, DefenseStat)> {
    LEAGUE_ALLOWED
        .iter()
        .find(|(m, g, _, _)| *m == market && *g == group)
        .map(|(_, _, avg, f)| (*avg, *f))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpponentAdjustment {
    pub allowed_per_game: f64,
    pub league_average: f64,
    pub ratio: f64,
}

/// Scales the mean toward the opponent's allowed rate. Without a usable defense row the
/// mean comes back untouched and no adjustment is reported.
pub fn adjusted_mean(
    mean: f64,
    market: PropMarket,
    group: DefenseGroup,
    defense: Option<&OpponentDefenseRow>,
    p: &PropParams,
) -> (f64, Option<OpponentAdjustment>) {
    let Some(defense) = defense.filter(|d| d.group == group) else {
        return (mean, None);
    };
    let Some((league_average, column)) = league_allowed(market, group) else {
        return (mean, None);
    };
    let Some(allowed_per_game) = defense.per_game(column(defense)) else {
        return (mean, None);
    };
    if !allowed_per_game.is_finite() || league_average <= 0.0 {
        return (mean, None);
    }
    let ratio = (allowed_per_game / league_average).clamp(p.opponent_ratio_min, p.opponent_ratio_max);
    let adjusted = mean * (1.0 + (ratio - 1.0) * p.opponent_damping);
    (
        adjusted,
        Some(OpponentAdjustment {
            allowed_per_game,
            league_average,
            ratio,
        }),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropSide {
    Over,
    Under,
    #[serde(rename = "No Bet")]
    NoBet,
}

impl PropSide {
    pub fn as_str(self) -> &'static str {
        match self {
            PropSide::Over => "Over",
            PropSide::Under => "Under",
            PropSide::NoBet => "No Bet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideDecision {
    pub side: PropSide,
    /// Model probability of the side that was evaluated best.
    pub probability: f64,
    pub implied: f64,
    pub edge: f64,
    pub odds: Option<f64>,
}

/// Picks the side with the larger probability edge; anything under `min_edge` is No Bet.
/// A side without a posted price cannot be chosen.
pub fn decide_side(
    p_over: f64,
    over_odds: Option<f64>,
    under_odds: Option<f64>,
    min_edge: f64,
) -> SideDecision {
    let over = over_odds.map(|odds| (PropSide::Over, p_over, american_to_implied(odds), odds));
    let under = under_odds.map(|odds| (PropSide::Under, 1.0 - p_over, american_to_implied(odds), odds));
    let best = match (over, under) {
        (Some(o), Some(u)) => {
            if u.1 - u.2 > o.1 - o.2 {
                Some(u)
            } else {
                Some(o)
            }
        }
        (o, u) => o.or(u),
    };
    match best {
        Some((side, probability, implied, odds)) => {
            let edge = probability - implied;
            SideDecision {
                side: if at_least(edge, min_edge) {
                    side
                } else {
                    PropSide::NoBet
                },
                probability,
                implied,
                edge,
                odds: Some(odds),
            }
        }
        None => SideDecision {
            side: PropSide::NoBet,
            probability: p_over,
            implied: 0.0,
            edge: 0.0,
            odds: None,
        },
    }
}

/// Opponent of the player's club in this game, if the player's club is one of the two sides.
pub fn opponent_for<'a>(player_team: &str, home_team: &'a str, away_team: &'a str) -> Option<&'a str> {
    if teams::same_team(player_team, home_team) {
        Some(away_team)
    } else if teams::same_team(player_team, away_team) {
        Some(home_team)
    } else {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropRecommendation {
    pub event_id: String,
    pub kickoff: Option<DateTime<Utc>>,
    pub player_name: String,
    pub team: String,
    pub opponent: String,
    pub position: Position,
    pub market: PropMarket,
    pub bookmaker: String,
    pub line: f64,
    pub over_odds: Option<f64>,
    pub under_odds: Option<f64>,
    pub side: PropSide,
    pub probability: f64,
    pub edge: f64,
    pub expected_value: f64,
    pub model_mean: f64,
    pub model_stdev: f64,
    pub implied_probability: f64,
    pub confidence: f64,
    pub reasoning: String,
}

impl PropRecommendation {
    pub fn is_recommended(&self) -> bool {
        self.side != PropSide::NoBet
    }
}

/// Full evaluation of one prop line. The caller has already matched the player, checked
/// eligibility and resolved the line value.
pub fn predict_prop(
    line: &PropLine,
    market: PropMarket,
    line_value: f64,
    player: &PlayerSeasonRow,
    opponent: &str,
    defense: Option<&OpponentDefenseRow>,
    cfg: &ModelConfig,
) -> PropRecommendation {
    let p = &cfg.props;
    let baseline = baseline_mean(Some(player), market, p);
    let (mean, adjustment) = match player.position.defense_group() {
        Some(group) => adjusted_mean(baseline.mean, market, group, defense, p),
        None => (baseline.mean, None),
    };
    let stdev = p.prior(market).stdev;
    let p_over = prob_over(mean, stdev, line_value);
    let decision = decide_side(p_over, line.over_odds, line.under_odds, p.min_edge);
    let ev = decision
        .odds
        .map(|odds| expected_value(decision.probability, odds))
        .unwrap_or(0.0);
    let confidence = prop_confidence(
        player.games_played,
        baseline.from_player,
        adjustment.is_some(),
        p,
    );

    let source = if baseline.from_player {
        format!("{} games of data", player.games_played)
    } else {
        "league average baseline".to_string()
    };
    let mut reasoning = match decision.side {
        PropSide::NoBet => format!(
            "No Bet: best edge {:+.1}% is below the {:.1}% floor. Model {mean:.1} {} vs line {line_value} ({source}).",
            decision.edge * 100.0,
            p.min_edge * 100.0,
            market.label()
        ),
        side => format!(
            "{} ({confidence:.0}%): {} {line_value} {}. Model {mean:.1} ({source}), P({}) {:.1}% vs implied {:.1}%, {:+.1}% edge, EV {ev:+.2}/unit.",
            prop_tier(confidence),
            side.as_str(),
            market.label(),
            side.as_str(),
            decision.probability * 100.0,
            decision.implied * 100.0,
            decision.edge * 100.0
        ),
    };
    if let Some(adj) = adjustment {
        reasoning.push_str(&format!(
            " {opponent} allows {:.1}/game vs league {:.1} (ratio {:.2}).",
            adj.allowed_per_game, adj.league_average, adj.ratio
        ));
    }

    PropRecommendation {
        event_id: line.event_id.clone(),
        kickoff: line.kickoff,
        player_name: player.player_name.clone(),
        team: player.team.clone(),
        opponent: opponent.to_string(),
        position: player.position,
        market,
        bookmaker: line.bookmaker.clone(),
        line: line_value,
        over_odds: line.over_odds,
        under_odds: line.under_odds,
        side: decision.side,
        probability: decision.probability,
        edge: decision.edge,
        expected_value: ev,
        model_mean: mean,
        model_stdev: stdev,
        implied_probability: decision.implied,
        confidence,
        reasoning,
    }
}
