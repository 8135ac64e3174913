use std::collections::HashMap;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamInfo {
    pub name: &'static str,
    pub abbr: &'static str,
    pub division: &'static str,
}

// Abbreviations follow Pro Football Reference, which is where the season rows come from.
pub const TEAMS: [TeamInfo; 32] = [
    team("Buffalo Bills", "BUF", "AFC East"),
    team("Miami Dolphins", "MIA", "AFC East"),
    team("New England Patriots", "NWE", "AFC East"),
    team("New York Jets", "NYJ", "AFC East"),
    team("Baltimore Ravens", "BAL", "AFC North"),
    team("Cincinnati Bengals", "CIN", "AFC North"),
    team("Cleveland Browns", "CLE", "AFC North"),
    team("Pittsburgh Steelers", "PIT", "AFC North"),
    team("Houston Texans", "HOU", "AFC South"),
    team("Indianapolis Colts", "IND", "AFC South"),
    team("Jacksonville Jaguars", "JAX", "AFC South"),
    team("Tennessee Titans", "TEN", "AFC South"),
    team("Denver Broncos", "DEN", "AFC West"),
    team("Kansas City Chiefs", "KAN", "AFC West"),
    team("Las Vegas Raiders", "LVR", "AFC West"),
    team("Los Angeles Chargers", "LAC", "AFC West"),
    team("Dallas Cowboys", "DAL", "NFC East"),
    team("New York Giants", "NYG", "NFC East"),
    team("Philadelphia Eagles", "PHI", "NFC East"),
    team("Washington Commanders", "WAS", "NFC East"),
    team("Chicago Bears", "CHI", "NFC North"),
    team("Detroit Lions", "DET", "NFC North"),
    team("Green Bay Packers", "GNB", "NFC North"),
    team("Minnesota Vikings", "MIN", "NFC North"),
    team("Atlanta Falcons", "ATL", "NFC South"),
    team("Carolina Panthers", "CAR", "NFC South"),
    team("New Orleans Saints", "NOR", "NFC South"),
    team("Tampa Bay Buccaneers", "TAM", "NFC South"),
    team("Arizona Cardinals", "ARI", "NFC West"),
    team("Los Angeles Rams", "LAR", "NFC West"),
    team("San Francisco 49ers", "SFO", "NFC West"),
    team("Seattle Seahawks", "SEA", "NFC West"),
];

const fn team(name: &'static str, abbr: &'static str, division: &'static str) -> TeamInfo {
    TeamInfo {
        name,
        abbr,
        division,
    }
}

static BY_KEY: Lazy<HashMap<String, &'static TeamInfo>> = Lazy::new(|| {
    let mut out = HashMap::new();
    for info in TEAMS.iter() {
        out.insert(normalize_key(info.name), info);
        out.insert(normalize_key(info.abbr), info);
    }
    out
});

/// Looks a club up by full name or abbreviation, ignoring case and surrounding space.
pub fn lookup(name: &str) -> Option<&'static TeamInfo> {
    BY_KEY.get(&normalize_key(name)).copied()
}

pub fn abbreviation(name: &str) -> Option<&'static str> {
    lookup(name).map(|t| t.abbr)
}

pub fn are_division_rivals(a: &str, b: &str) -> bool {
    match (lookup(a), lookup(b)) {
        (Some(a), Some(b)) => a.abbr != b.abbr && a.division == b.division,
        _ => false,
    }
}

/// True when both strings name the same club, whichever form each one uses.
pub fn same_team(a: &str, b: &str) -> bool {
    match (lookup(a), lookup(b)) {
        (Some(a), Some(b)) => a.abbr == b.abbr,
        _ => normalize_key(a) == normalize_key(b),
    }
}

pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_eight_divisions_of_four() {
        let mut sizes: HashMap<&str, usize> = HashMap::new();
        for t in TEAMS.iter() {
            *sizes.entry(t.division).or_default() += 1;
        }
        assert_eq!(sizes.len(), 8);
        assert!(sizes.values().all(|n| *n == 4));
    }

    #[test]
    fn rivals_match_by_name_or_abbreviation() {
        assert!(are_division_rivals("Kansas City Chiefs", "LVR"));
        assert!(are_division_rivals("gnb", "Chicago Bears"));
        assert!(!are_division_rivals("Kansas City Chiefs", "Buffalo Bills"));
        assert!(!are_division_rivals("Kansas City Chiefs", "KAN"));
        assert!(!are_division_rivals("Nowhere FC", "KAN"));
    }

    #[test]
    fn same_team_handles_unknown_names() {
        assert!(same_team("SFO", "San Francisco 49ers"));
        assert!(same_team("Expansion Club", " expansion club"));
        assert!(!same_team("SFO", "SEA"));
    }
}
