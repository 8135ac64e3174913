//! Raw season rows to bounded 0-100 sub-scores.

use crate::stats::{InjuredPlayer, TeamSeasonStats};

const OFFENSE_SCALE: f64 = 12.0;
const DEFENSE_SCALE: f64 = 10.0;
const ESTIMATED_SNAP_SHARE: f64 = 60.0;
const RECENCY_WEIGHTS: [f64; 3] = [0.25, 0.35, 0.40];

pub fn offense_score(stats: &TeamSeasonStats) -> f64 {
    let ppg = clamp_score(stats.points_per_game / 35.0 * 100.0);
    let rating = clamp_score((stats.offensive_rating.unwrap_or(0.0) + 10.0) / 20.0 * 100.0);
    ppg * 0.7 + rating * 0.3
}

pub fn defense_score(stats: &TeamSeasonStats) -> f64 {
    let pa = clamp_score((30.0 - stats.points_allowed_per_game) / 15.0 * 100.0);
    match stats.yards_per_play_allowed {
        Some(ypp) => {
            let ypp = clamp_score((6.5 - ypp) / 2.5 * 100.0);
            pa * 0.6 + ypp * 0.4
        }
        None => pa,
    }
}

pub fn turnover_score(stats: &TeamSeasonStats) -> f64 {
    match stats.turnover_differential {
        Some(diff) => clamp_score((diff + 15.0) / 30.0 * 100.0),
        None => 50.0,
    }
}

pub fn recent_form_score(stats: &TeamSeasonStats) -> f64 {
    let Some(form) = stats.last_3_games.as_deref().filter(|s| !s.trim().is_empty()) else {
        return clamp_score(stats.win_percentage * 100.0);
    };
    let results: Vec<bool> = form
        .split('-')
        .map(|r| r.trim().eq_ignore_ascii_case("w"))
        .collect();
    let wins = results.iter().filter(|w| **w).count();
    let base = match wins {
        0 => 20.0,
        1 => 35.0,
        2 => 55.0,
        _ => 80.0,
    };
    let recency: f64 = results
        .iter()
        .zip(RECENCY_WEIGHTS)
        .map(|(won, w)| if *won { 100.0 * w } else { 0.0 })
        .sum();
    clamp_score(base * 0.60 + recency * 0.40)
}

pub fn home_field_score(stats: &TeamSeasonStats, is_home: bool) -> f64 {
    if !is_home {
        return 50.0;
    }
    match stats.home_record.as_deref().and_then(parse_record) {
        Some((wins, losses)) => {
            let total = (wins + losses).max(1);
            clamp_score(wins as f64 / total as f64 * 100.0)
        }
        None => clamp_score(57.0 + (stats.win_percentage * 100.0 - 50.0) * 0.5),
    }
}

pub fn consistency_score(stats: &TeamSeasonStats, k: f64) -> f64 {
    (100.0 - (stats.margin_of_victory.abs() * k).min(100.0)).max(0.0)
}

pub fn record_quality_score(stats: &TeamSeasonStats) -> f64 {
    clamp_score(stats.win_percentage * 100.0 * (1.0 + stats.strength_of_schedule / 10.0))
}

#[derive(Debug, Clone, PartialEq)]
pub struct InjuryImpact {
    pub offense_score: f64,
    pub defense_score: f64,
    pub details: Vec<String>,
}

impl InjuryImpact {
    pub fn combined(&self) -> f64 {
        (self.offense_score + self.defense_score) / 2.0
    }
}

pub fn injury_impact(injuries: &[InjuredPlayer]) -> InjuryImpact {
    let mut offense = 0.0;
    let mut defense = 0.0;
    let mut details = Vec::new();

    for player in injuries {
        let pos = player.position.trim().to_ascii_uppercase();
        let weight = position_weight(&pos);
        let (share, estimated) = match player.snap_share {
            Some(s) if s.is_finite() => (s.clamp(0.0, 100.0), false),
            _ => (ESTIMATED_SNAP_SHARE, true),
        };
        let impact = weight * share / 100.0;
        let side = if is_offensive(&pos) {
            offense += impact;
            "OFF"
        } else if is_defensive(&pos) {
            defense += impact;
            "DEF"
        } else {
            continue;
        };
        let note = if estimated { " (est.)" } else { "" };
        details.push(format!(
            "{} ({pos}): {share:.1}% snaps{note} x {weight} weight = {impact:.3} {side} impact",
            player.name
        ));
    }

    let offense_penalty = (offense / OFFENSE_SCALE * 100.0).min(100.0);
    let defense_penalty = (defense / DEFENSE_SCALE * 100.0).min(100.0);
    InjuryImpact {
        offense_score: (100.0 - offense_penalty).max(0.0),
        defense_score: (100.0 - defense_penalty).max(0.0),
        details,
    }
}

pub fn position_weight(pos: &str) -> f64 {
    match pos {
        "QB" => 1.0,
        "LT" | "RT" | "EDGE" | "DE" | "CB" => 0.6,
        "T" => 0.5,
        "WR" | "RB" | "LB" | "S" | "DB" | "OLB" | "ILB" | "MLB" | "FS" | "SS" => 0.4,
        "TE" | "DL" | "DT" | "C" => 0.3,
        "OL" | "NT" => 0.25,
        "G" => 0.2,
        "FB" => 0.15,
        "K" | "P" | "LS" => 0.05,
        _ => 0.2,
    }
}

fn is_offensive(pos: &str) -> bool {
    matches!(
        pos,
        "QB" | "RB" | "WR" | "TE" | "OL" | "LT" | "RT" | "G" | "C" | "T" | "FB"
    )
}

fn is_defensive(pos: &str) -> bool {
    matches!(
        pos,
        "DE" | "DL"
            | "DT"
            | "NT"
            | "EDGE"
            | "LB"
            | "OLB"
            | "ILB"
            | "MLB"
            | "CB"
            | "S"
            | "FS"
            | "SS"
            | "DB"
    )
}

/// Leading number of a market string such as "-6.5", "+3", "-6.5 (-110)" or "PK".
/// Anything after the first number is ignored; no number at all is 0.
pub fn parse_market_number(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let chars: Vec<char> = raw.chars().filter(|c| *c != '+').collect();
    let starts_number = |i: usize| {
        let digit_at = |j: usize| chars.get(j).is_some_and(|c| c.is_ascii_digit());
        match chars[i] {
            c if c.is_ascii_digit() => true,
            '.' => digit_at(i + 1),
            '-' => digit_at(i + 1) || (chars.get(i + 1) == Some(&'.') && digit_at(i + 2)),
            _ => false,
        }
    };
    let Some(start) = (0..chars.len()).find(|&i| starts_number(i)) else {
        return 0.0;
    };

    let mut token = String::new();
    let mut rest = chars[start..].iter().peekable();
    if rest.peek() == Some(&&'-') {
        token.push('-');
        rest.next();
    }
    let mut int_digits = 0;
    while let Some(c) = rest.next_if(|c| c.is_ascii_digit()) {
        token.push(*c);
        int_digits += 1;
    }
    if int_digits == 0 {
        token.push('0');
    }
    if rest.next_if(|c| **c == '.').is_some() {
        let mut frac = String::new();
        while let Some(c) = rest.next_if(|c| c.is_ascii_digit()) {
            frac.push(*c);
        }
        if !frac.is_empty() {
            token.push('.');
            token.push_str(&frac);
        }
    }
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

fn parse_record(raw: &str) -> Option<(u32, u32)> {
    let mut parts = raw.split('-').map(|s| s.trim().parse::<u32>());
    let wins = parts.next()?.ok()?;
    let losses = parts.next()?.ok()?;
    Some((wins, losses))
}

pub fn clamp_score(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 100.0)
}
