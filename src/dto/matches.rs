use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::{common::ScoreboardSnapshot, validation::validate_total_sets},
    state::game::{MAX_PLAYER_NAME_LEN, MatchType, Side, Sport},
};

/// Highest win score the scoreboard accepts.
const MAX_WIN_SCORE: u32 = 99;
/// Longest best-of series the scoreboard accepts.
const MAX_TOTAL_SETS: u32 = 9;

/// Settings for a new match. Omitted values fall back to the configured defaults.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StartMatchRequest {
    /// Sport deciding the serve rules.
    pub sport: Sport,
    /// Singles unless given.
    #[serde(default = "default_match_type")]
    pub match_type: MatchType,
    /// Points needed to win a set.
    #[serde(default)]
    pub win_score: Option<u32>,
    /// Best-of count, must be odd.
    #[serde(default)]
    pub total_sets: Option<u32>,
    /// Name of the first slot.
    #[serde(default)]
    pub player1_name: Option<String>,
    /// Name of the second slot.
    #[serde(default)]
    pub player2_name: Option<String>,
}

fn default_match_type() -> MatchType {
    MatchType::Single
}

impl Validate for StartMatchRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(win_score) = self.win_score
            && !(1..=MAX_WIN_SCORE).contains(&win_score)
        {
            let mut err = ValidationError::new("range");
            err.message =
                Some(format!("Win score must be between 1 and {MAX_WIN_SCORE}").into());
            errors.add("win_score", err);
        }

        if let Some(total_sets) = self.total_sets {
            if !(1..=MAX_TOTAL_SETS).contains(&total_sets) {
                let mut err = ValidationError::new("range");
                err.message =
                    Some(format!("Total sets must be between 1 and {MAX_TOTAL_SETS}").into());
                errors.add("total_sets", err);
            } else if let Err(err) = validate_total_sets(total_sets) {
                errors.add("total_sets", err);
            }
        }

        for (field, name) in [
            ("player1_name", &self.player1_name),
            ("player2_name", &self.player2_name),
        ] {
            if let Some(name) = name
                && name.chars().count() > MAX_PLAYER_NAME_LEN
            {
                let mut err = ValidationError::new("length");
                err.message = Some(
                    format!("Player names are limited to {MAX_PLAYER_NAME_LEN} characters")
                        .into(),
                );
                errors.add(field, err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Credit a point to one slot.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct PointRequest {
    /// Slot credited with the point.
    pub side: Side,
}

/// Result of a scoring command.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommandResponse {
    /// False when the command was ignored (wrong phase, nothing to undo).
    pub applied: bool,
    /// Why the command was ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Scoreboard after the command.
    pub scoreboard: ScoreboardSnapshot,
}
