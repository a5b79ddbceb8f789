//! Scoring commands. Each one locks the scoreboard, commits, snapshots and then hands the
//! resulting outputs to [`effects::dispatch`] in commit order.

use tracing::{debug, info};

use crate::{
    dto::{
        common::ScoreboardSnapshot,
        matches::{CommandResponse, StartMatchRequest},
    },
    error::ServiceError,
    services::effects,
    state::{
        SharedState,
        controller::MatchController,
        game::{MatchConfig, PlayerNames, Side},
        output::{CommandOutcome, IgnoredReason, MatchOutput, TransitionTicket},
    },
};

/// Current scoreboard without changing anything.
pub async fn snapshot(state: &SharedState) -> ScoreboardSnapshot {
    let view = state.scoreboard().lock().await.view();
    ScoreboardSnapshot::new(view, state.is_degraded())
}

/// Start a new match from idle.
pub async fn start_match(
    state: &SharedState,
    request: StartMatchRequest,
) -> Result<ScoreboardSnapshot, ServiceError> {
    let config = match_config(state, request)?;
    info!(sport = ?config.sport(), match_type = ?config.match_type(), "starting match");
    commit(state, |controller| {
        controller.start_match(config).map_err(ServiceError::from)
    })
    .await
}

/// Leave the current match, finished or not.
pub async fn end_match(state: &SharedState) -> Result<ScoreboardSnapshot, ServiceError> {
    info!("returning scoreboard to idle");
    commit(state, |controller| {
        controller.return_to_idle().map_err(ServiceError::from)
    })
    .await
}

/// Credit one point to `side`.
pub async fn score_point(state: &SharedState, side: Side) -> CommandResponse {
    run_command(state, |controller| controller.score_point(side)).await
}

/// Take back the last point of the current set.
pub async fn undo(state: &SharedState) -> CommandResponse {
    run_command(state, MatchController::undo).await
}

/// Take back the last point if it went to `side`.
pub async fn correct_point(state: &SharedState, side: Side) -> CommandResponse {
    run_command(state, |controller| controller.correct_point(side)).await
}

/// Players change ends.
pub async fn swap_courts(state: &SharedState) -> CommandResponse {
    run_command(state, MatchController::swap_courts).await
}

/// Zero the current set.
pub async fn reset_set(state: &SharedState) -> CommandResponse {
    run_command(state, MatchController::reset_set).await
}

/// Fired once the pause between sets elapsed.
pub async fn begin_next_set(state: &SharedState, ticket: TransitionTicket) -> CommandResponse {
    run_command(state, |controller| controller.begin_next_set(ticket)).await
}

fn match_config(
    state: &SharedState,
    request: StartMatchRequest,
) -> Result<MatchConfig, ServiceError> {
    let defaults = &state.config().scoring;
    let fallback = PlayerNames::default();
    let players = PlayerNames {
        player1: request.player1_name.unwrap_or(fallback.player1),
        player2: request.player2_name.unwrap_or(fallback.player2),
    };

    Ok(MatchConfig::new(
        request.sport,
        request.match_type,
        request.win_score.unwrap_or(defaults.default_win_score),
        request.total_sets.unwrap_or(defaults.default_total_sets),
        players,
    )?)
}

async fn run_command<F>(state: &SharedState, command: F) -> CommandResponse
where
    F: FnOnce(&mut MatchController) -> CommandOutcome,
{
    let result = commit(state, |controller| match command(controller) {
        CommandOutcome::Applied(outputs) => Ok(outputs),
        CommandOutcome::Ignored(reason) => Err(reason),
    })
    .await;

    match result {
        Ok(scoreboard) => CommandResponse {
            applied: true,
            reason: None,
            scoreboard,
        },
        Err(reason) => {
            debug!(?reason, "command ignored");
            CommandResponse {
                applied: false,
                reason: Some(describe(reason)),
                scoreboard: snapshot(state).await,
            }
        }
    }
}

/// Run `command` under the scoreboard lock and dispatch its outputs once committed.
///
/// The emit gate is taken before the scoreboard lock is released so outputs of concurrent
/// commands reach the collaborators in commit order.
async fn commit<F, E>(state: &SharedState, command: F) -> Result<ScoreboardSnapshot, E>
where
    F: FnOnce(&mut MatchController) -> Result<Vec<MatchOutput>, E>,
{
    let mut controller = state.scoreboard().lock().await;
    let outputs = command(&mut *controller)?;
    let snapshot = ScoreboardSnapshot::new(controller.view(), state.is_degraded());
    let gate = state.emit_gate().lock().await;
    drop(controller);

    effects::dispatch(state.clone(), outputs, snapshot.clone()).await;
    drop(gate);
    Ok(snapshot)
}

fn describe(reason: IgnoredReason) -> String {
    match reason {
        IgnoredReason::NotInGame(phase) => format!("no set in progress (phase {phase:?})"),
        IgnoredReason::NothingToUndo => "nothing to undo in the current set".into(),
        IgnoredReason::LastPointElsewhere(side) => {
            format!("last point of the set went to {side:?}")
        }
        IgnoredReason::StaleTicket => "scheduled transition no longer applies".into(),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use futures::future::{self, BoxFuture};
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            history_store::{HistoryStore, InMemoryHistoryStore},
            models::HistoryEntryEntity,
            storage::StorageResult,
        },
        services::{
            narration::{NarrationError, NarrationSink},
            recording::{RecordingController, RecordingError, RecordingToken},
        },
        state::{
            AppState, SseHub,
            game::{MatchType, Sport},
            output::Announcement,
            state_machine::MatchPhase,
        },
    };

    #[derive(Default)]
    struct RecordingNarrator {
        heard: Mutex<Vec<Announcement>>,
    }

    impl RecordingNarrator {
        fn heard(&self) -> Vec<Announcement> {
            self.heard.lock().unwrap().clone()
        }
    }

    impl NarrationSink for RecordingNarrator {
        fn announce(&self, announcement: &Announcement) -> Result<(), NarrationError> {
            self.heard.lock().unwrap().push(announcement.clone());
            Ok(())
        }
    }

    struct FixedRecorder;

    impl RecordingController for FixedRecorder {
        fn start_recording(
            &self,
            match_id: Uuid,
            sport: Sport,
        ) -> BoxFuture<'static, Result<RecordingToken, RecordingError>> {
            Box::pin(async move {
                Ok(RecordingToken {
                    match_id,
                    sport,
                    filename: "match.webm".into(),
                })
            })
        }

        fn stop_recording(
            &self,
            token: RecordingToken,
        ) -> BoxFuture<'static, Result<Option<String>, RecordingError>> {
            Box::pin(async move { Ok(Some(token.filename)) })
        }
    }

    struct SilentNarrator;

    impl NarrationSink for SilentNarrator {
        fn announce(&self, _announcement: &Announcement) -> Result<(), NarrationError> {
            let err = serde_json::from_str::<u8>("speech engine offline").unwrap_err();
            Err(NarrationError::Encode(err))
        }
    }

    struct BrokenRecorder;

    impl BrokenRecorder {
        fn failure() -> RecordingError {
            RecordingError::Encode(serde_json::from_str::<u8>("camera offline").unwrap_err())
        }
    }

    impl RecordingController for BrokenRecorder {
        fn start_recording(
            &self,
            _match_id: Uuid,
            _sport: Sport,
        ) -> BoxFuture<'static, Result<RecordingToken, RecordingError>> {
            Box::pin(async { Err(Self::failure()) })
        }

        fn stop_recording(
            &self,
            _token: RecordingToken,
        ) -> BoxFuture<'static, Result<Option<String>, RecordingError>> {
            Box::pin(async { Err(Self::failure()) })
        }
    }

    /// History backend whose writes never complete.
    struct StalledStore;

    impl HistoryStore for StalledStore {
        fn append(&self, _entry: HistoryEntryEntity) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(future::pending())
        }

        fn list(&self) -> BoxFuture<'static, StorageResult<Vec<HistoryEntryEntity>>> {
            Box::pin(future::pending())
        }

        fn update_memo(
            &self,
            _id: Uuid,
            _memo: String,
        ) -> BoxFuture<'static, StorageResult<HistoryEntryEntity>> {
            Box::pin(future::pending())
        }

        fn attach_video(
            &self,
            _match_id: Uuid,
            _video_ref: String,
        ) -> BoxFuture<'static, StorageResult<usize>> {
            Box::pin(future::pending())
        }

        fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(future::pending())
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    async fn state_with(
        narrator: Arc<dyn NarrationSink>,
        recorder: Arc<dyn RecordingController>,
        store: Arc<dyn HistoryStore>,
    ) -> SharedState {
        let mut config = AppConfig::default();
        config.scoring.default_win_score = 3;
        let state = AppState::with_collaborators(config, SseHub::new(64), narrator, recorder);
        state.set_history_store(store).await;
        state
    }

    struct Harness {
        state: SharedState,
        narrator: Arc<RecordingNarrator>,
        store: Arc<InMemoryHistoryStore>,
    }

    async fn harness() -> Harness {
        let mut config = AppConfig::default();
        config.scoring.default_win_score = 3;
        let narrator = Arc::new(RecordingNarrator::default());
        let state = AppState::with_collaborators(
            config,
            SseHub::new(64),
            narrator.clone(),
            Arc::new(FixedRecorder),
        );
        let store = Arc::new(InMemoryHistoryStore::new());
        state.set_history_store(store.clone()).await;
        Harness {
            state,
            narrator,
            store,
        }
    }

    fn request(sport: Sport) -> StartMatchRequest {
        StartMatchRequest {
            sport,
            match_type: MatchType::Single,
            win_score: None,
            total_sets: None,
            player1_name: Some("Ana".into()),
            player2_name: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn set_end_pauses_then_starts_the_next_set() {
        let h = harness().await;
        start_match(&h.state, request(Sport::TableTennis)).await.unwrap();
        for _ in 0..3 {
            assert!(score_point(&h.state, Side::Player1).await.applied);
        }

        let paused = snapshot(&h.state).await;
        assert_eq!(paused.phase, MatchPhase::SetEnded);
        assert!(!score_point(&h.state, Side::Player2).await.applied);

        // Let the history writer catch up.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let entries = h.store.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!((entries[0].score1, entries[0].score2), (3, 0));
        assert_eq!(entries[0].player2_name, "Player 2");

        tokio::time::sleep(Duration::from_millis(2100)).await;
        let resumed = snapshot(&h.state).await;
        assert_eq!(resumed.phase, MatchPhase::InGame);
        assert_eq!(resumed.current.unwrap().set_number, 2);
        assert!(
            h.narrator
                .heard()
                .contains(&Announcement::SetStart { set_number: 2 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abandoning_during_the_pause_cancels_the_next_set() {
        let h = harness().await;
        start_match(&h.state, request(Sport::Footvolley)).await.unwrap();
        for _ in 0..3 {
            score_point(&h.state, Side::Player2).await;
        }
        end_match(&h.state).await.unwrap();
        start_match(&h.state, request(Sport::Badminton)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(2100)).await;
        let current = snapshot(&h.state).await;
        assert_eq!(current.phase, MatchPhase::InGame);
        assert_eq!(current.current.unwrap().set_number, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_match_gets_its_recording_attached() {
        let h = harness().await;
        let mut req = request(Sport::TableTennis);
        req.total_sets = Some(1);
        start_match(&h.state, req).await.unwrap();
        // Let the spawned recording start settle.
        tokio::time::sleep(Duration::from_millis(10)).await;

        for _ in 0..3 {
            score_point(&h.state, Side::Player1).await;
        }
        assert_eq!(snapshot(&h.state).await.phase, MatchPhase::MatchEnded);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let entries = h.store.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].video_ref.as_deref(), Some("match.webm"));
        assert!(h.narrator.heard().contains(&Announcement::MatchEnd {
            winner: Side::Player1,
            name: "Ana".into()
        }));
    }

    #[tokio::test]
    async fn invalid_configuration_is_rejected_before_any_change() {
        let h = harness().await;
        let mut req = request(Sport::Badminton);
        req.total_sets = Some(2);
        assert!(matches!(
            start_match(&h.state, req).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert_eq!(snapshot(&h.state).await.phase, MatchPhase::Idle);
        assert!(h.narrator.heard().is_empty());
    }

    #[tokio::test]
    async fn undo_outside_a_match_reports_the_reason() {
        let h = harness().await;
        let response = undo(&h.state).await;
        assert!(!response.applied);
        assert!(response.reason.unwrap().contains("Idle"));
    }

    #[tokio::test]
    async fn history_outage_does_not_stop_scoring() {
        let h = harness().await;
        h.store.set_available(false);
        start_match(&h.state, request(Sport::Pickleball)).await.unwrap();
        for _ in 0..3 {
            score_point(&h.state, Side::Player1).await;
        }
        assert_eq!(snapshot(&h.state).await.phase, MatchPhase::SetEnded);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_history_does_not_hold_up_the_match() {
        let state = state_with(
            Arc::new(RecordingNarrator::default()),
            Arc::new(FixedRecorder),
            Arc::new(StalledStore),
        )
        .await;
        start_match(&state, request(Sport::Badminton)).await.unwrap();

        for _ in 0..3 {
            let response = tokio::time::timeout(
                Duration::from_secs(5),
                score_point(&state, Side::Player1),
            )
            .await
            .expect("scoring must not wait on the history store");
            assert!(response.applied);
        }
        assert_eq!(snapshot(&state).await.phase, MatchPhase::SetEnded);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        let resumed = snapshot(&state).await;
        assert_eq!(resumed.phase, MatchPhase::InGame);
        assert_eq!(resumed.current.unwrap().set_number, 2);
        assert!(score_point(&state, Side::Player2).await.applied);

        let idle = tokio::time::timeout(Duration::from_secs(5), end_match(&state))
            .await
            .expect("ending must not wait on the history store")
            .unwrap();
        assert_eq!(idle.phase, MatchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_collaborators_never_stop_the_match() {
        let store = Arc::new(InMemoryHistoryStore::new());
        let state = state_with(
            Arc::new(SilentNarrator),
            Arc::new(BrokenRecorder),
            store.clone(),
        )
        .await;
        start_match(&state, request(Sport::TableTennis)).await.unwrap();

        for _ in 0..3 {
            assert!(score_point(&state, Side::Player1).await.applied);
        }
        assert_eq!(snapshot(&state).await.phase, MatchPhase::SetEnded);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(snapshot(&state).await.phase, MatchPhase::InGame);

        for _ in 0..3 {
            assert!(score_point(&state, Side::Player1).await.applied);
        }
        let finished = snapshot(&state).await;
        assert_eq!(finished.phase, MatchPhase::MatchEnded);
        assert_eq!(finished.current.unwrap().winner, Some(Side::Player1));

        tokio::time::sleep(Duration::from_millis(10)).await;
        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry.video_ref.is_none()));
    }

    #[tokio::test]
    async fn correction_leaves_the_other_side_alone() {
        let h = harness().await;
        start_match(&h.state, request(Sport::Pickleball)).await.unwrap();
        score_point(&h.state, Side::Player1).await;
        score_point(&h.state, Side::Player2).await;

        let response = correct_point(&h.state, Side::Player1).await;
        assert!(!response.applied);
        let current = response.scoreboard.current.unwrap();
        assert_eq!((current.player1.score, current.player2.score), (1, 1));

        let response = correct_point(&h.state, Side::Player2).await;
        assert!(response.applied);
        let current = response.scoreboard.current.unwrap();
        assert_eq!((current.player1.score, current.player2.score), (1, 0));
    }
}
