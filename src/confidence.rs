//! Confidence strategies, one per bet family.
//!
//! Spread and totals confidence look alike but read different inputs, weights and
//! consistency factors, and share no code path.

use crate::config::{PropParams, SpreadParams, TotalsParams};
use crate::normalize::{clamp_score, consistency_score, record_quality_score};
use crate::stats::TeamSeasonStats;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadConfidence {
    pub strength_gap: f64,
    pub consistency: f64,
    pub record_quality: f64,
    pub score: f64,
}

pub fn spread_confidence(
    home: &TeamSeasonStats,
    away: &TeamSeasonStats,
    home_strength: f64,
    away_strength: f64,
    p: &SpreadParams,
) -> SpreadConfidence {
    let strength_gap =
        clamp_score((home_strength - away_strength).abs() / p.strength_gap_divisor * 100.0);
    let consistency =
        (consistency_score(home, p.consistency_k) + consistency_score(away, p.consistency_k)) / 2.0;
    let record_quality = (record_quality_score(home) + record_quality_score(away)) / 2.0;
    let score = clamp_score(
        strength_gap * p.weight_strength
            + consistency * p.weight_consistency
            + record_quality * p.weight_record,
    );
    SpreadConfidence {
        strength_gap,
        consistency,
        record_quality,
        score,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalsConfidence {
    pub data_quality: f64,
    pub sample_size: f64,
    pub consistency: f64,
    pub score: f64,
}

pub fn totals_confidence(
    home: &TeamSeasonStats,
    away: &TeamSeasonStats,
    p: &TotalsParams,
) -> TotalsConfidence {
    let quality = |t: &TeamSeasonStats| if t.has_full_ratings() { 100.0 } else { 60.0 };
    let data_quality = (quality(home) + quality(away)) / 2.0;
    let avg_games = (home.games_played() + away.games_played()) as f64 / 2.0;
    let sample_size = sample_size_score(avg_games, p.full_sample_games);
    let consistency =
        (consistency_score(home, p.consistency_k) + consistency_score(away, p.consistency_k)) / 2.0;
    let score = clamp_score(
        data_quality * p.weight_data_quality
            + sample_size * p.weight_sample_size
            + consistency * p.weight_consistency,
    );
    TotalsConfidence {
        data_quality,
        sample_size,
        consistency,
        score,
    }
}

/// Confidence attached to a prop pick. Informational only; props gate on probability edge.
pub fn prop_confidence(
    games_played: u32,
    baseline_from_player: bool,
    opponent_applied: bool,
    p: &PropParams,
) -> f64 {
    let sample = sample_size_score(games_played as f64, p.full_sample_games);
    let source = if baseline_from_player { 100.0 } else { 40.0 };
    let matchup = if opponent_applied { 100.0 } else { 50.0 };
    clamp_score(sample * 0.40 + source * 0.30 + matchup * 0.30)
}

fn sample_size_score(games: f64, full_sample: f64) -> f64 {
    if full_sample <= 0.0 {
        return 100.0;
    }
    clamp_score(games / full_sample * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(wins: u32, losses: u32, mov: f64) -> TeamSeasonStats {
        let games = wins + losses;
        TeamSeasonStats {
            wins,
            losses,
            win_percentage: if games == 0 {
                0.0
            } else {
                wins as f64 / games as f64
            },
            margin_of_victory: mov,
            rating: Some(1.0),
            offensive_rating: Some(0.5),
            defensive_rating: Some(0.5),
            ..Default::default()
        }
    }

    #[test]
    fn spread_confidence_grows_with_strength_gap() {
        let p = SpreadParams::default();
        let (h, a) = (team(6, 3, 4.0), team(3, 6, -4.0));
        let close = spread_confidence(&h, &a, 55.0, 54.0, &p);
        let wide = spread_confidence(&h, &a, 70.0, 45.0, &p);
        assert!(wide.score > close.score);
        assert_eq!(wide.strength_gap, 100.0);
        assert!((close.strength_gap - 5.0).abs() < 1e-9);
        // consistency k=2: both teams 100 - 8
        assert!((close.consistency - 92.0).abs() < 1e-9);
    }

    #[test]
    fn totals_consistency_uses_steeper_factor() {
        let sp = SpreadParams::default();
        let tp = TotalsParams::default();
        let (h, a) = (team(6, 3, 10.0), team(5, 4, 10.0));
        let spread = spread_confidence(&h, &a, 50.0, 50.0, &sp);
        let totals = totals_confidence(&h, &a, &tp);
        assert!((spread.consistency - 80.0).abs() < 1e-9);
        assert!((totals.consistency - 70.0).abs() < 1e-9);
    }

    #[test]
    fn totals_confidence_reflects_missing_ratings_and_sample() {
        let tp = TotalsParams::default();
        let mut h = team(2, 2, 0.0);
        let a = team(2, 2, 0.0);
        let full = totals_confidence(&h, &a, &tp);
        assert_eq!(full.data_quality, 100.0);
        assert_eq!(full.sample_size, 50.0);
        // 0.4 * 100 + 0.3 * 50 + 0.3 * 100
        assert!((full.score - 85.0).abs() < 1e-9);

        h.rating = None;
        let partial = totals_confidence(&h, &a, &tp);
        assert_eq!(partial.data_quality, 80.0);
        assert!(partial.score < full.score);
    }

    #[test]
    fn zero_games_do_not_break_confidence() {
        let tp = TotalsParams::default();
        let blank = TeamSeasonStats::default();
        let c = totals_confidence(&blank, &blank, &tp);
        assert_eq!(c.sample_size, 0.0);
        assert!(c.score.is_finite());
    }

    #[test]
    fn prop_confidence_rewards_player_data() {
        let p = PropParams::default();
        assert_eq!(prop_confidence(8, true, true, &p), 100.0);
        assert!(prop_confidence(8, false, false, &p) < prop_confidence(8, true, false, &p));
        assert!((prop_confidence(0, false, false, &p) - 27.0).abs() < 1e-9);
    }
}
