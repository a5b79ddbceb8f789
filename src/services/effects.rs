//! Runs the side effects the scoreboard asked for, strictly after its state was committed.
//! Collaborator failures are logged and never reach the match state. Nothing here waits on a
//! collaborator: history writes are queued and recordings run in their own tasks.

use futures::future::BoxFuture;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::common::ScoreboardSnapshot,
    services::{history_service::HistoryJob, match_service, recording::RecordingToken, sse_events},
    state::{
        SharedState,
        game::Sport,
        output::{MatchOutput, MatchSummary},
        state_machine::MatchPhase,
    },
};

/// Dispatch `outputs` in order. `snapshot` is the scoreboard taken under the same lock as the
/// command that produced them.
///
/// Boxed because delayed transitions re-enter the scoreboard and dispatch again.
pub fn dispatch(
    state: SharedState,
    outputs: Vec<MatchOutput>,
    snapshot: ScoreboardSnapshot,
) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        for output in outputs {
            match output {
                MatchOutput::Announce(announcement) => {
                    if let Err(err) = state.narrator().announce(&announcement) {
                        warn!(error = %err, ?announcement, "narration failed");
                    }
                }
                MatchOutput::Refresh => sse_events::broadcast_scoreboard(&state, &snapshot),
                MatchOutput::RecordSet(record) => state.queue_history(HistoryJob::RecordSet(record)),
                MatchOutput::StartRecording { match_id, sport } => {
                    tokio::spawn(start_recording(state.clone(), match_id, sport));
                }
                MatchOutput::StopRecording { match_id } => {
                    tokio::spawn(stop_recording(state.clone(), match_id));
                }
                MatchOutput::ScheduleNextSet(ticket) => {
                    let state = state.clone();
                    let delay = state.config().scoring.set_transition_delay;
                    tokio::spawn(async move {
                        sleep(delay).await;
                        match_service::begin_next_set(&state, ticket).await;
                    });
                }
                MatchOutput::ScheduleSummary(summary) => {
                    let state = state.clone();
                    let delay = state.config().scoring.match_end_display_delay;
                    tokio::spawn(async move {
                        sleep(delay).await;
                        show_summary(&state, summary).await;
                    });
                }
            }
        }
    })
}

async fn start_recording(state: SharedState, match_id: Uuid, sport: Sport) {
    let mut slot = state.recording().lock().await;
    if let Some(previous) = slot.take() {
        warn!(match_id = %previous.match_id, "stopping a recording that was never stopped");
        finish_recording(&state, previous).await;
    }

    match state.recorder().start_recording(match_id, sport).await {
        Ok(token) => {
            slot.replace(token);
        }
        Err(err) => warn!(match_id = %match_id, error = %err, "failed to start recording"),
    }
}

async fn stop_recording(state: SharedState, match_id: Uuid) {
    let token = {
        let mut slot = state.recording().lock().await;
        match slot.take() {
            Some(token) if token.match_id == match_id => token,
            other => {
                *slot = other;
                debug!(match_id = %match_id, "no recording in progress for this match");
                return;
            }
        }
    };

    finish_recording(&state, token).await;
}

/// Stop `token` and queue its file for the match history.
async fn finish_recording(state: &SharedState, token: RecordingToken) {
    let match_id = token.match_id;
    match state.recorder().stop_recording(token).await {
        Ok(Some(filename)) => state.queue_history(HistoryJob::AttachVideo { match_id, filename }),
        Ok(None) => {}
        Err(err) => warn!(match_id = %match_id, error = %err, "failed to stop recording"),
    }
}

/// Show the final result unless the match was already left.
async fn show_summary(state: &SharedState, summary: MatchSummary) {
    let still_showing = {
        let controller = state.scoreboard().lock().await;
        controller.phase() == MatchPhase::MatchEnded
            && controller.match_id() == Some(summary.match_id)
    };

    if still_showing {
        info!(match_id = %summary.match_id, winner = ?summary.winner, "showing match summary");
        sse_events::broadcast_match_summary(state, summary);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        config::AppConfig,
        services::{
            narration::SseNarrator,
            recording::{RecordingController, RecordingError},
        },
        state::{AppState, SseHub},
    };

    /// Remembers which recordings were stopped.
    #[derive(Default)]
    struct LoggingRecorder {
        stopped: Mutex<Vec<Uuid>>,
    }

    impl LoggingRecorder {
        fn stopped(&self) -> Vec<Uuid> {
            self.stopped.lock().unwrap().clone()
        }
    }

    impl RecordingController for LoggingRecorder {
        fn start_recording(
            &self,
            match_id: Uuid,
            sport: Sport,
        ) -> BoxFuture<'static, Result<RecordingToken, RecordingError>> {
            Box::pin(async move {
                Ok(RecordingToken {
                    match_id,
                    sport,
                    filename: format!("{match_id}.webm"),
                })
            })
        }

        fn stop_recording(
            &self,
            token: RecordingToken,
        ) -> BoxFuture<'static, Result<Option<String>, RecordingError>> {
            self.stopped.lock().unwrap().push(token.match_id);
            Box::pin(async move { Ok(Some(token.filename)) })
        }
    }

    #[tokio::test]
    async fn leftover_recording_is_stopped_before_the_next_one() {
        let config = AppConfig::default();
        let display = SseHub::new(16);
        let narrator = Arc::new(SseNarrator::new(display.clone(), config.narration.clone()));
        let recorder = Arc::new(LoggingRecorder::default());
        let state = AppState::with_collaborators(config, display, narrator, recorder.clone());
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());

        start_recording(state.clone(), first, Sport::Badminton).await;
        start_recording(state.clone(), second, Sport::Footvolley).await;
        assert_eq!(recorder.stopped(), vec![first]);
        assert_eq!(
            state.recording().lock().await.as_ref().map(|token| token.match_id),
            Some(second)
        );

        // A late stop for the first match leaves the new recording running.
        stop_recording(state.clone(), first).await;
        assert_eq!(recorder.stopped(), vec![first]);

        stop_recording(state.clone(), second).await;
        assert_eq!(recorder.stopped(), vec![first, second]);
        assert!(state.recording().lock().await.is_none());
    }
}
