use serde::{Deserialize, Serialize};

use crate::config::StrengthWeights;
use crate::normalize::{
    clamp_score, defense_score, home_field_score, injury_impact, offense_score, recent_form_score,
    turnover_score,
};
use crate::stats::TeamSeasonStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthBreakdown {
    pub offense: f64,
    pub defense: f64,
    pub turnovers: f64,
    pub recent_form: f64,
    pub home_field: f64,
    pub injury: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamStrength {
    pub score: f64,
    pub breakdown: StrengthBreakdown,
    pub injury_details: Vec<String>,
}

/// Single 0-100 strength figure for one side of a matchup.
///
/// Injuries discount the offense and defense sub-scores directly and also enter
/// the blend as their own term.
pub fn team_strength(stats: &TeamSeasonStats, is_home: bool, w: &StrengthWeights) -> TeamStrength {
    let injury = injury_impact(&stats.injuries);
    let offense = offense_score(stats) * (injury.offense_score / 100.0);
    let defense = defense_score(stats) * (injury.defense_score / 100.0);
    let turnovers = turnover_score(stats);
    let recent_form = recent_form_score(stats);
    let home_field = home_field_score(stats, is_home);
    let injury_combined = injury.combined();

    let score = clamp_score(
        offense * w.offense
            + defense * w.defense
            + turnovers * w.turnovers
            + recent_form * w.recent_form
            + home_field * w.home_field
            + injury_combined * w.injury,
    );

    TeamStrength {
        score,
        breakdown: StrengthBreakdown {
            offense,
            defense,
            turnovers,
            recent_form,
            home_field,
            injury: injury_combined,
        },
        injury_details: injury.details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::InjuredPlayer;

    fn stats() -> TeamSeasonStats {
        TeamSeasonStats {
            team: "Home".to_string(),
            wins: 5,
            losses: 4,
            win_percentage: 0.556,
            points_per_game: 23.0,
            points_allowed_per_game: 21.0,
            offensive_rating: Some(1.0),
            defensive_rating: Some(0.5),
            ..Default::default()
        }
    }

    #[test]
    fn strength_is_bounded_and_home_aware() {
        let w = StrengthWeights::default();
        let home = team_strength(&stats(), true, &w);
        let away = team_strength(&stats(), false, &w);
        assert!(home.score >= 0.0 && home.score <= 100.0);
        assert_eq!(away.breakdown.home_field, 50.0);
        assert_ne!(home.score, away.score);
    }

    #[test]
    fn injuries_lower_strength() {
        let w = StrengthWeights::default();
        let healthy = team_strength(&stats(), true, &w);
        let mut hurt = stats();
        hurt.injuries.push(InjuredPlayer {
            name: "QB1".to_string(),
            position: "QB".to_string(),
            snap_share: Some(100.0),
        });
        let hurt = team_strength(&hurt, true, &w);
        assert!(hurt.score < healthy.score);
        assert!(hurt.breakdown.offense < healthy.breakdown.offense);
        assert_eq!(hurt.breakdown.defense, healthy.breakdown.defense);
        assert_eq!(hurt.injury_details.len(), 1);
    }
}
