use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Longest display name accepted for a player or pair.
pub const MAX_PLAYER_NAME_LEN: usize = 32;

/// One of the two scoreboard slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// First scoreboard slot.
    Player1,
    /// Second scoreboard slot.
    Player2,
}

impl Side {
    /// The opposing slot.
    pub fn other(self) -> Self {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }

    /// Zero-based index used for per-side arrays.
    pub fn index(self) -> usize {
        match self {
            Side::Player1 => 0,
            Side::Player2 => 1,
        }
    }
}

/// Sports supported by the scoreboard. Each variant selects a serve-rotation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Sport {
    /// Two-serve rotation.
    TableTennis,
    /// Rally scoring, server follows the scorer.
    Badminton,
    /// Same rotation as badminton.
    Pickleball,
    /// Footvolley-style net sport (Jokgu).
    Footvolley,
}

impl Sport {
    /// Stable identifier used in history entries and recording filenames.
    pub fn slug(self) -> &'static str {
        match self {
            Sport::TableTennis => "table-tennis",
            Sport::Badminton => "badminton",
            Sport::Pickleball => "pickleball",
            Sport::Footvolley => "footvolley",
        }
    }
}

/// Singles or doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// One player per side.
    Single,
    /// Two players per side.
    Double,
}

/// Display names for both scoreboard slots as configured at match start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerNames {
    /// First slot.
    pub player1: String,
    /// Second slot.
    pub player2: String,
}

impl PlayerNames {
    /// Name registered for `side`.
    pub fn get(&self, side: Side) -> &str {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }
}

impl Default for PlayerNames {
    fn default() -> Self {
        Self {
            player1: "Player 1".into(),
            player2: "Player 2".into(),
        }
    }
}

/// Reasons a match configuration is rejected before the match starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Win score below one.
    #[error("win score must be at least 1 (got {0})")]
    WinScoreTooLow(u32),
    /// Zero sets requested.
    #[error("total sets must be at least 1 (got {0})")]
    NoSets(u32),
    /// Even best-of count, which could end tied.
    #[error("total sets must be odd (got {0})")]
    EvenSetCount(u32),
    /// Blank player name.
    #[error("player name must not be empty")]
    EmptyPlayerName,
    /// Player name over the length limit.
    #[error("player name `{0}` exceeds {max} characters", max = MAX_PLAYER_NAME_LEN)]
    PlayerNameTooLong(String),
}

/// Immutable settings for a single match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    sport: Sport,
    match_type: MatchType,
    win_score: u32,
    total_sets: u32,
    players: PlayerNames,
}

impl MatchConfig {
    /// Validate every field and build the configuration. Nothing is partially applied:
    /// either all values are accepted or an error is returned.
    pub fn new(
        sport: Sport,
        match_type: MatchType,
        win_score: u32,
        total_sets: u32,
        players: PlayerNames,
    ) -> Result<Self, ConfigError> {
        if win_score < 1 {
            return Err(ConfigError::WinScoreTooLow(win_score));
        }
        if total_sets < 1 {
            return Err(ConfigError::NoSets(total_sets));
        }
        if total_sets % 2 == 0 {
            return Err(ConfigError::EvenSetCount(total_sets));
        }

        let players = PlayerNames {
            player1: normalize_name(players.player1)?,
            player2: normalize_name(players.player2)?,
        };

        Ok(Self {
            sport,
            match_type,
            win_score,
            total_sets,
            players,
        })
    }

    /// Sport deciding the serve rules.
    pub fn sport(&self) -> Sport {
        self.sport
    }

    /// Singles or doubles.
    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    /// Points needed to win a set.
    pub fn win_score(&self) -> u32 {
        self.win_score
    }

    /// Best-of count.
    pub fn total_sets(&self) -> u32 {
        self.total_sets
    }

    /// Names of both slots.
    pub fn players(&self) -> &PlayerNames {
        &self.players
    }

    /// Number of set wins needed to take the match.
    pub fn sets_to_win(&self) -> u32 {
        self.total_sets.div_ceil(2)
    }
}

fn normalize_name(name: String) -> Result<String, ConfigError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyPlayerName);
    }
    if trimmed.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err(ConfigError::PlayerNameTooLong(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}
