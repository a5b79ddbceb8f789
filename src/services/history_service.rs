use std::sync::Weak;

use time::{OffsetDateTime, macros::format_description};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::HistoryEntryEntity,
    dto::history::{HistoryEntry, UpdateMemoRequest},
    error::ServiceError,
    services::local_now,
    state::{AppState, SharedState, output::SetRecord},
};

/// Write queued for the background history writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryJob {
    /// Append a completed set.
    RecordSet(SetRecord),
    /// Link a finished recording to the sets of its match.
    AttachVideo { match_id: Uuid, filename: String },
}

/// Apply queued writes one at a time, in submission order.
///
/// Runs apart from the scoring commands so a slow or stalled store never holds up a match.
/// Stops once the application state is gone.
pub async fn run_writer(state: Weak<AppState>, mut jobs: mpsc::UnboundedReceiver<HistoryJob>) {
    while let Some(job) = jobs.recv().await {
        let Some(state) = state.upgrade() else {
            break;
        };
        match job {
            HistoryJob::RecordSet(record) => {
                let set_number = record.set_number;
                if let Err(err) = record_set(&state, record).await {
                    warn!(error = %err, set_number, "failed to record completed set");
                }
            }
            HistoryJob::AttachVideo { match_id, filename } => {
                if let Err(err) = attach_video(&state, match_id, filename).await {
                    warn!(match_id = %match_id, error = %err, "failed to attach recording to history");
                }
            }
        }
    }
    debug!("history writer stopped");
}

/// Store a completed set, stamped with the device's local date and time.
pub async fn record_set(state: &SharedState, record: SetRecord) -> Result<(), ServiceError> {
    let store = state.require_history_store().await?;
    let entry = history_entry(record, local_now())?;
    info!(
        match_id = %entry.match_id,
        set = entry.set_number,
        score1 = entry.score1,
        score2 = entry.score2,
        "recording completed set"
    );
    store.append(entry).await?;
    Ok(())
}

/// Link the recording file to every stored set of `match_id`.
pub async fn attach_video(
    state: &SharedState,
    match_id: Uuid,
    filename: String,
) -> Result<usize, ServiceError> {
    let store = state.require_history_store().await?;
    let updated = store.attach_video(match_id, filename).await?;
    info!(match_id = %match_id, updated, "attached recording to history");
    Ok(updated)
}

/// Every stored set, oldest first.
pub async fn list_history(state: &SharedState) -> Result<Vec<HistoryEntry>, ServiceError> {
    let store = state.require_history_store().await?;
    let entries = store.list().await?;
    Ok(entries.into_iter().map(HistoryEntry::from).collect())
}

/// Replace the free-text memo of one entry.
pub async fn update_memo(
    state: &SharedState,
    id: Uuid,
    request: UpdateMemoRequest,
) -> Result<HistoryEntry, ServiceError> {
    let store = state.require_history_store().await?;
    let updated = store.update_memo(id, request.memo).await?;
    Ok(updated.into())
}

/// Delete every stored set.
pub async fn clear_history(state: &SharedState) -> Result<(), ServiceError> {
    let store = state.require_history_store().await?;
    store.clear().await?;
    info!("match history cleared");
    Ok(())
}

fn history_entry(record: SetRecord, at: OffsetDateTime) -> Result<HistoryEntryEntity, ServiceError> {
    let format_err = |err: time::error::Format| ServiceError::InvalidState(err.to_string());
    let date = at
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(format_err)?;
    let time = at
        .format(format_description!("[hour]:[minute]:[second]"))
        .map_err(format_err)?;

    Ok(HistoryEntryEntity {
        id: Uuid::new_v4(),
        match_id: record.match_id,
        date,
        time,
        sport: record.sport,
        set_number: record.set_number,
        player1_name: record.player1_name,
        score1: record.score1,
        player2_name: record.player2_name,
        score2: record.score2,
        memo: String::new(),
        video_ref: None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::history_store::InMemoryHistoryStore,
        state::{AppState, game::Sport},
    };

    fn record(match_id: Uuid, set_number: u32) -> SetRecord {
        SetRecord {
            match_id,
            sport: Sport::TableTennis,
            set_number,
            player1_name: "Ana".into(),
            score1: 11,
            player2_name: "Bo".into(),
            score2: 7,
        }
    }

    #[test]
    fn entries_carry_local_date_and_time() {
        let entry = history_entry(record(Uuid::nil(), 2), datetime!(2026-03-01 18:04:09 +09:00))
            .unwrap();
        assert_eq!(entry.date, "2026-03-01");
        assert_eq!(entry.time, "18:04:09");
        assert_eq!(entry.set_number, 2);
        assert!(entry.memo.is_empty());
    }

    #[tokio::test]
    async fn degraded_mode_rejects_history_calls() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            list_history(&state).await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn sets_and_videos_end_up_in_the_store() {
        let state = AppState::new(AppConfig::default());
        let store = Arc::new(InMemoryHistoryStore::new());
        state.set_history_store(store).await;
        let match_id = Uuid::new_v4();

        record_set(&state, record(match_id, 1)).await.unwrap();
        record_set(&state, record(match_id, 2)).await.unwrap();
        assert_eq!(
            attach_video(&state, match_id, "table-tennis_x.webm".into())
                .await
                .unwrap(),
            2
        );

        let entries = list_history(&state).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.video_ref.as_deref() == Some("table-tennis_x.webm")));

        let edited = update_memo(
            &state,
            entries[0].id,
            UpdateMemoRequest {
                memo: "final".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(edited.memo, "final");

        clear_history(&state).await.unwrap();
        assert!(list_history(&state).await.unwrap().is_empty());
    }
}
