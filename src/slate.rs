use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::engine::StatsSource;
use crate::stats::{
    DefenseGroup, OpponentDefenseRow, PlayerSeasonRow, PropLine, SpreadLine, TeamSeasonStats,
    TotalLine,
};
use crate::teams;

/// One week of inputs: season rows plus every posted line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Slate {
    pub week: u32,
    pub season: u32,
    pub teams: Vec<TeamSeasonStats>,
    pub players: Vec<PlayerSeasonRow>,
    pub defenses: Vec<OpponentDefenseRow>,
    pub spreads: Vec<SpreadLine>,
    pub totals: Vec<TotalLine>,
    pub props: Vec<PropLine>,
    #[serde(skip)]
    index: OnceCell<SlateIndex>,
}

#[derive(Debug, Clone, Default)]
struct SlateIndex {
    teams: HashMap<String, usize>,
    players: HashMap<String, usize>,
    defenses: HashMap<(String, DefenseGroup), usize>,
}

/// Club key shared by full names and abbreviations; unknown clubs use their trimmed lowercase name.
fn team_key(name: &str) -> String {
    match teams::abbreviation(name) {
        Some(abbr) => abbr.to_string(),
        None => teams::normalize_key(name),
    }
}

impl Slate {
    pub fn from_json(raw: &str) -> Result<Self> {
        let slate: Slate = serde_json::from_str(raw).context("parse slate json")?;
        Ok(slate)
    }

    fn index(&self) -> &SlateIndex {
        self.index.get_or_init(|| {
            let mut idx = SlateIndex::default();
            for (i, t) in self.teams.iter().enumerate() {
                idx.teams.entry(team_key(&t.team)).or_insert(i);
            }
            for (i, p) in self.players.iter().enumerate() {
                idx.players
                    .entry(teams::normalize_key(&p.player_name))
                    .or_insert(i);
            }
            for (i, d) in self.defenses.iter().enumerate() {
                idx.defenses
                    .entry((team_key(&d.team), d.group))
                    .or_insert(i);
            }
            idx
        })
    }
}

impl StatsSource for Slate {
    fn team_stats(&self, team: &str) -> Option<&TeamSeasonStats> {
        let i = *self.index().teams.get(&team_key(team))?;
        self.teams.get(i)
    }

    fn player(&self, name: &str) -> Option<&PlayerSeasonRow> {
        let i = *self.index().players.get(&teams::normalize_key(name))?;
        self.players.get(i)
    }

    fn defense(&self, team: &str, group: DefenseGroup) -> Option<&OpponentDefenseRow> {
        let i = *self.index().defenses.get(&(team_key(team), group))?;
        self.defenses.get(i)
    }
}

pub fn load_slate(path: &Path) -> Result<Slate> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read slate {}", path.display()))?;
    let slate = Slate::from_json(&raw).with_context(|| format!("load slate {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        week = slate.week,
        season = slate.season,
        teams = slate.teams.len(),
        players = slate.players.len(),
        spreads = slate.spreads.len(),
        totals = slate.totals.len(),
        props = slate.props.len(),
        "slate loaded"
    );
    Ok(slate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case_and_name_form() {
        let raw = r#"{
            "week": 11,
            "season": 2025,
            "teams": [
                { "team": "Kansas City Chiefs", "wins": 6, "losses": 3 },
                { "team": "Expansion Club", "wins": 1 }
            ],
            "players": [
                { "player_name": "Jo Runner", "team": "KAN", "position": "RB", "games_played": 9,
                  "stats": { "table": "rushing", "rushing_yards": 600 } }
            ],
            "defenses": [
                { "team": "LVR", "group": "vs_rb", "games_played": 9, "rush_yds": 1100 }
            ]
        }"#;
        let slate = Slate::from_json(raw).unwrap();
        assert_eq!(slate.team_stats("KAN").map(|t| t.wins), Some(6));
        assert_eq!(slate.team_stats("kansas city chiefs").map(|t| t.wins), Some(6));
        assert!(slate.team_stats(" expansion club ").is_some());
        assert!(slate.team_stats("Buffalo Bills").is_none());
        assert!(slate.player("JO RUNNER").is_some());
        assert!(slate.defense("Las Vegas Raiders", DefenseGroup::VsRb).is_some());
        assert!(slate.defense("Las Vegas Raiders", DefenseGroup::VsWr).is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_slate(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{err:#}").contains("read slate"));
    }
}
