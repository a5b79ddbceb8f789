use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dao::models::HistoryEntryEntity, state::game::Sport};

/// One completed set in the match history.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntry {
    /// Entry identifier, used for memo edits.
    pub id: Uuid,
    /// Match the set belongs to.
    pub match_id: Uuid,
    /// Local date the set ended, `YYYY-MM-DD`.
    pub date: String,
    /// Local time the set ended, `HH:MM:SS`.
    pub time: String,
    /// Sport the set was played in.
    pub sport: Sport,
    /// 1-based set number.
    pub set_number: u32,
    /// First slot name.
    pub player1_name: String,
    /// First slot score.
    pub score1: u32,
    /// Second slot name.
    pub player2_name: String,
    /// Second slot score.
    pub score2: u32,
    /// Free-text note.
    pub memo: String,
    /// Recording of the match, once it was saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_ref: Option<String>,
}

impl From<HistoryEntryEntity> for HistoryEntry {
    fn from(entity: HistoryEntryEntity) -> Self {
        Self {
            id: entity.id,
            match_id: entity.match_id,
            date: entity.date,
            time: entity.time,
            sport: entity.sport,
            set_number: entity.set_number,
            player1_name: entity.player1_name,
            score1: entity.score1,
            player2_name: entity.player2_name,
            score2: entity.score2,
            memo: entity.memo,
            video_ref: entity.video_ref,
        }
    }
}

/// Replace the memo of a history entry.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct UpdateMemoRequest {
    /// New memo, replacing the previous one.
    #[validate(length(max = 500))]
    pub memo: String,
}
