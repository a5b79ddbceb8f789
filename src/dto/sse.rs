use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::game::{Side, Sport};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to a display when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether match history is currently unavailable.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// True while match history cannot be written.
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
/// Text for the display to speak, with the voice parameters to use.
pub struct NarrationEvent {
    /// Announcement kind (`score`, `set_win`, ...).
    pub kind: String,
    /// Sentence to speak.
    pub text: String,
    /// BCP 47 language tag for voice selection.
    pub lang: String,
    /// Speech rate.
    pub rate: f32,
    /// Voice pitch.
    pub pitch: f32,
}

/// Whether the display starts or stops capturing.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordingAction {
    /// Begin capturing.
    Start,
    /// Stop and save the capture.
    Stop,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
/// Asks the display to start or stop capturing the camera.
pub struct RecordingEvent {
    /// Start or stop.
    pub action: RecordingAction,
    /// Match being recorded.
    pub match_id: Uuid,
    /// Sport of the match.
    pub sport: Sport,
    /// Name the display must save the capture under.
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
/// Final result, shown once the end-of-match pause elapsed.
pub struct MatchSummaryEvent {
    /// Finished match.
    pub match_id: Uuid,
    /// Winning slot.
    pub winner: Side,
    /// Name of the winner.
    pub winner_name: String,
    /// Sets won by the first slot.
    pub sets_won1: u32,
    /// Sets won by the second slot.
    pub sets_won2: u32,
}
