use serde::Serialize;
use tracing::{info, warn};

use crate::{
    dto::{
        common::ScoreboardSnapshot,
        sse::{MatchSummaryEvent, ServerEvent, SystemStatus},
    },
    state::{SharedState, output::MatchSummary},
};

const EVENT_SCOREBOARD: &str = "scoreboard";
const EVENT_MATCH_SUMMARY: &str = "match.summary";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Push the latest scoreboard to every display.
pub fn broadcast_scoreboard(state: &SharedState, snapshot: &ScoreboardSnapshot) {
    send_display_event(state, EVENT_SCOREBOARD, snapshot);
}

/// Show the final result of a finished match.
pub fn broadcast_match_summary(state: &SharedState, summary: MatchSummary) {
    let payload = MatchSummaryEvent {
        match_id: summary.match_id,
        winner: summary.winner,
        winner_name: summary.winner_name,
        sets_won1: summary.sets_won1,
        sets_won2: summary.sets_won2,
    };
    send_display_event(state, EVENT_MATCH_SUMMARY, &payload);
}

/// Tell displays whether match history is currently being saved.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_display_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

/// Relay degraded-mode changes to the display stream until the state is dropped.
pub async fn forward_degraded_changes(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        info!(degraded, "history availability changed");
        broadcast_system_status(&state, degraded);
    }
}

fn send_display_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.display().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize display SSE payload"),
    }
}
