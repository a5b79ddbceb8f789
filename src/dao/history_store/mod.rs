/// History stored in a JSON file.
pub mod json_file;
/// History kept in memory.
pub mod memory;

use crate::dao::models::HistoryEntryEntity;
use crate::dao::storage::{StorageError, StorageResult};
use futures::future::BoxFuture;
use uuid::Uuid;

pub use self::{json_file::JsonFileHistoryStore, memory::InMemoryHistoryStore};

/// Abstraction over the persistence layer for completed sets.
pub trait HistoryStore: Send + Sync {
    /// Store one completed set.
    fn append(&self, entry: HistoryEntryEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Entries in insertion order.
    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<HistoryEntryEntity>>>;
    /// Replace the memo of entry `id`.
    fn update_memo(&self, id: Uuid, memo: String)
    -> BoxFuture<'static, StorageResult<HistoryEntryEntity>>;
    /// Attach `video_ref` to every entry of `match_id`, returning how many were updated.
    fn attach_video(
        &self,
        match_id: Uuid,
        video_ref: String,
    ) -> BoxFuture<'static, StorageResult<usize>>;
    /// Remove every entry.
    fn clear(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Try to recover after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Apply a memo edit to an in-memory list of entries.
fn apply_memo(
    entries: &mut [HistoryEntryEntity],
    id: Uuid,
    memo: String,
) -> StorageResult<HistoryEntryEntity> {
    let entry = entries
        .iter_mut()
        .find(|entry| entry.id == id)
        .ok_or(StorageError::EntryNotFound(id))?;
    entry.memo = memo;
    Ok(entry.clone())
}

/// Attach a video reference to the entries of one match.
fn apply_video(entries: &mut [HistoryEntryEntity], match_id: Uuid, video_ref: &str) -> usize {
    entries
        .iter_mut()
        .filter(|entry| entry.match_id == match_id)
        .map(|entry| entry.video_ref = Some(video_ref.to_string()))
        .count()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use uuid::Uuid;

    use crate::{dao::models::HistoryEntryEntity, state::game::Sport};

    pub fn entry(match_id: Uuid, set_number: u32) -> HistoryEntryEntity {
        HistoryEntryEntity {
            id: Uuid::new_v4(),
            match_id,
            date: "2026-10-18".into(),
            time: "14:03:11".into(),
            sport: Sport::Badminton,
            set_number,
            player1_name: "Ana".into(),
            score1: 21,
            player2_name: "Bo".into(),
            score2: 19,
            memo: String::new(),
            video_ref: None,
        }
    }
}
