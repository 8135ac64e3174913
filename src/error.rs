use thiserror::Error;

/// Why a game or prop produced no prediction. None of these stop a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    #[error("missing team stats for {0}")]
    MissingTeamStats(String),

    #[error("no season row for player {0}")]
    MissingPlayer(String),

    #[error("no line posted for {0}")]
    MissingLine(String),

    #[error("{market} is not offered for {position} {player}")]
    IneligibleMarket {
        player: String,
        position: String,
        market: String,
    },

    #[error("unknown prop market: {0}")]
    UnknownMarket(String),

    #[error("{player} ({team}) does not play in {home} vs {away}")]
    PlayerNotInGame {
        player: String,
        team: String,
        home: String,
        away: String,
    },
}

impl Skip {
    /// Short stable tag used when counting skips in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Skip::MissingTeamStats(_) => "missing_team_stats",
            Skip::MissingPlayer(_) => "missing_player",
            Skip::MissingLine(_) => "missing_line",
            Skip::IneligibleMarket { .. } => "ineligible_market",
            Skip::UnknownMarket(_) => "unknown_market",
            Skip::PlayerNotInGame { .. } => "player_not_in_game",
        }
    }
}
