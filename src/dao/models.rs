use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::game::Sport;

/// One completed set as stored in the match history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntryEntity {
    /// Stable identifier for the entry.
    pub id: Uuid,
    /// Match the set belongs to.
    pub match_id: Uuid,
    /// Local calendar date the set finished (`YYYY-MM-DD`).
    pub date: String,
    /// Local wall-clock time the set finished (`HH:MM:SS`).
    pub time: String,
    /// Sport the set was played in.
    pub sport: Sport,
    /// 1-based set number within the match.
    pub set_number: u32,
    /// Name shown in the first slot when the set ended.
    pub player1_name: String,
    /// Final score of the first slot.
    pub score1: u32,
    /// Name shown in the second slot when the set ended.
    pub player2_name: String,
    /// Final score of the second slot.
    pub score2: u32,
    /// Free-form note edited from the history screen.
    #[serde(default)]
    pub memo: String,
    /// Filename of the match recording, attached once the recording stops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_ref: Option<String>,
}
