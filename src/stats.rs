use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamSeasonStats {
    pub team: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub win_percentage: f64,
    pub points_for: f64,
    pub points_against: f64,
    pub points_per_game: f64,
    pub points_allowed_per_game: f64,
    pub point_differential: f64,
    pub margin_of_victory: f64,
    pub strength_of_schedule: f64,
    // SRS-style combined rating; offense/defense components below.
    pub rating: Option<f64>,
    pub offensive_rating: Option<f64>,
    pub defensive_rating: Option<f64>,
    pub yards_per_play_allowed: Option<f64>,
    pub turnover_differential: Option<f64>,
    // "W-L"
    pub home_record: Option<String>,
    // "W-W-L", most recent result last.
    pub last_3_games: Option<String>,
    pub injuries: Vec<InjuredPlayer>,
}

impl TeamSeasonStats {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Season total spread over games played; 0 when no games are on record.
    pub fn per_game(&self, season_total: f64) -> f64 {
        let games = self.games_played();
        if games == 0 {
            return 0.0;
        }
        season_total / games as f64
    }

    pub fn margin_per_game(&self) -> f64 {
        self.per_game(self.point_differential)
    }

    /// Offensive plus defensive rating. Missing components count as zero.
    pub fn combined_rating(&self) -> f64 {
        self.offensive_rating.unwrap_or(0.0) + self.defensive_rating.unwrap_or(0.0)
    }

    pub fn overall_rating(&self) -> f64 {
        self.rating.unwrap_or_else(|| self.combined_rating())
    }

    pub fn has_full_ratings(&self) -> bool {
        self.rating.is_some() && self.offensive_rating.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InjuredPlayer {
    pub name: String,
    pub position: String,
    /// Share of snaps (0-100) the player was taking before the injury.
    #[serde(default)]
    pub snap_share: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadLine {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    pub home_spread: Option<String>,
    #[serde(default)]
    pub away_spread: Option<String>,
    #[serde(default)]
    pub home_price: Option<String>,
    #[serde(default)]
    pub away_price: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalLine {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bookmaker: String,
    pub over_line: f64,
    #[serde(default)]
    pub over_price: f64,
    #[serde(default)]
    pub under_line: f64,
    #[serde(default)]
    pub under_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropLine {
    pub event_id: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
    pub player_name: String,
    pub market: String,
    #[serde(default)]
    pub bookmaker: String,
    #[serde(default)]
    pub line: Option<f64>,
    #[serde(default)]
    pub over_odds: Option<f64>,
    #[serde(default)]
    pub under_odds: Option<f64>,
}

/// Reads from any spelling `parse` accepts; writes the uppercase label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Position {
    Qb,
    Rb,
    Fb,
    Wr,
    Te,
    Other,
}

impl From<String> for Position {
    fn from(raw: String) -> Self {
        Position::parse(&raw)
    }
}

impl Position {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "QB" => Position::Qb,
            "RB" | "HB" => Position::Rb,
            "FB" => Position::Fb,
            "WR" => Position::Wr,
            "TE" => Position::Te,
            _ => Position::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Position::Qb => "QB",
            Position::Rb => "RB",
            Position::Fb => "FB",
            Position::Wr => "WR",
            Position::Te => "TE",
            Position::Other => "OTHER",
        }
    }

    pub fn defense_group(self) -> Option<DefenseGroup> {
        match self {
            Position::Qb => Some(DefenseGroup::VsQb),
            Position::Rb | Position::Fb => Some(DefenseGroup::VsRb),
            Position::Wr => Some(DefenseGroup::VsWr),
            Position::Te => Some(DefenseGroup::VsTe),
            Position::Other => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSeasonRow {
    pub player_name: String,
    pub team: String,
    pub position: Position,
    #[serde(default)]
    pub games_played: u32,
    pub stats: StatTable,
    #[serde(default)]
    pub total_tds: Option<f64>,
}

/// The single position table a player row was read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum StatTable {
    Passing(PassingLine),
    Rushing(RushingLine),
    Receiving(ReceivingLine),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassingLine {
    pub passing_yards: Option<f64>,
    pub passing_tds: Option<f64>,
    pub completions: Option<f64>,
    pub attempts: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RushingLine {
    pub rushing_yards: Option<f64>,
    pub rushing_attempts: Option<f64>,
    pub rushing_tds: Option<f64>,
    pub receptions: Option<f64>,
    pub receiving_yards: Option<f64>,
    pub receiving_tds: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceivingLine {
    pub targets: Option<f64>,
    pub receptions: Option<f64>,
    pub receiving_yards: Option<f64>,
    pub receiving_tds: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseGroup {
    VsQb,
    VsRb,
    VsWr,
    VsTe,
}

/// What a defense gave up to one position group over the season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentDefenseRow {
    pub team: String,
    pub group: DefenseGroup,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub pass_yds: Option<f64>,
    #[serde(default)]
    pub pass_tds: Option<f64>,
    #[serde(default)]
    pub pass_cmp: Option<f64>,
    #[serde(default)]
    pub pass_att: Option<f64>,
    #[serde(default)]
    pub rush_yds: Option<f64>,
    #[serde(default)]
    pub rush_tds: Option<f64>,
    #[serde(default)]
    pub rec_yds: Option<f64>,
    #[serde(default)]
    pub receptions: Option<f64>,
    #[serde(default)]
    pub rec_tds: Option<f64>,
    #[serde(default)]
    pub sacks: Option<f64>,
}

impl OpponentDefenseRow {
    pub fn per_game(&self, total: Option<f64>) -> Option<f64> {
        let total = total?;
        if self.games_played == 0 {
            return None;
        }
        Some(total / self.games_played as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_game_rates_fall_back_to_zero_without_games() {
        let stats = TeamSeasonStats {
            point_differential: 42.0,
            ..Default::default()
        };
        assert_eq!(stats.games_played(), 0);
        assert_eq!(stats.margin_per_game(), 0.0);
    }

    #[test]
    fn overall_rating_prefers_reported_rating() {
        let mut stats = TeamSeasonStats {
            offensive_rating: Some(4.0),
            defensive_rating: Some(-1.5),
            ..Default::default()
        };
        assert_eq!(stats.overall_rating(), 2.5);
        stats.rating = Some(3.1);
        assert_eq!(stats.overall_rating(), 3.1);
        assert_eq!(stats.combined_rating(), 2.5);
    }

    #[test]
    fn position_parse_and_serde_agree() {
        assert_eq!(Position::parse(" wr "), Position::Wr);
        assert_eq!(Position::parse("HB"), Position::Rb);
        assert_eq!(Position::parse("K"), Position::Other);
        let p: Position = serde_json::from_str("\"TE\"").unwrap();
        assert_eq!(p, Position::Te);
        let p: Position = serde_json::from_str("\"LS\"").unwrap();
        assert_eq!(p, Position::Other);
        let p: Position = serde_json::from_str("\"HB\"").unwrap();
        assert_eq!(p, Position::Rb);
        let p: Position = serde_json::from_str("\"wr\"").unwrap();
        assert_eq!(p, Position::Wr);
        for pos in [Position::Qb, Position::Fb, Position::Te, Position::Other] {
            let json = serde_json::to_string(&pos).unwrap();
            assert_eq!(json, format!("\"{}\"", pos.label()));
            assert_eq!(serde_json::from_str::<Position>(&json).unwrap(), pos);
        }
    }

    #[test]
    fn stat_table_is_tagged_by_table_name() {
        let raw = r#"{"table":"receiving","receptions":50,"receiving_yards":612}"#;
        let table: StatTable = serde_json::from_str(raw).unwrap();
        match table {
            StatTable::Receiving(line) => assert_eq!(line.receiving_yards, Some(612.0)),
            other => panic!("unexpected table {other:?}"),
        }
    }
}
