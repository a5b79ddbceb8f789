//! Match video capture. The camera lives in the display page, so the backend only decides when
//! to record and what the file is called.

use futures::future::BoxFuture;
use thiserror::Error;
use time::{OffsetDateTime, macros::format_description};
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::sse::{RecordingAction, RecordingEvent, ServerEvent},
    services::local_now,
    state::{SseHub, game::Sport},
};

const EVENT_RECORDING: &str = "recording";

/// Failures of a recording controller.
#[derive(Debug, Error)]
pub enum RecordingError {
    /// Request could not be serialised.
    #[error("failed to encode recording request: {0}")]
    Encode(#[from] serde_json::Error),
    /// File name timestamp could not be formatted.
    #[error("failed to format recording timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Handle for a recording in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingToken {
    /// Match being recorded.
    pub match_id: Uuid,
    /// Sport of the match, used in the file name.
    pub sport: Sport,
    /// Name the capture is saved under.
    pub filename: String,
}

/// Starts and stops match recordings.
pub trait RecordingController: Send + Sync {
    /// Start recording `match_id`.
    fn start_recording(
        &self,
        match_id: Uuid,
        sport: Sport,
    ) -> BoxFuture<'static, Result<RecordingToken, RecordingError>>;
    /// Stop the recording, returning the saved filename when one was produced.
    fn stop_recording(
        &self,
        token: RecordingToken,
    ) -> BoxFuture<'static, Result<Option<String>, RecordingError>>;
}

/// `{sport}_{YYYYMMDD}_{HHMMSS}.webm`
pub fn recording_filename(sport: Sport, at: OffsetDateTime) -> Result<String, RecordingError> {
    let stamp = at.format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))?;
    Ok(format!("{}_{stamp}.webm", sport.slug()))
}

/// Asks the connected display to capture the camera.
#[derive(Clone)]
pub struct ClientRecorder {
    hub: SseHub,
}

impl ClientRecorder {
    /// Recorder driving the display's camera through `hub`.
    pub fn new(hub: SseHub) -> Self {
        Self { hub }
    }

    fn send(&self, action: RecordingAction, token: &RecordingToken) -> Result<(), RecordingError> {
        let payload = RecordingEvent {
            action,
            match_id: token.match_id,
            sport: token.sport,
            filename: token.filename.clone(),
        };
        self.hub
            .broadcast(ServerEvent::json(Some(EVENT_RECORDING.to_string()), &payload)?);
        Ok(())
    }
}

impl RecordingController for ClientRecorder {
    fn start_recording(
        &self,
        match_id: Uuid,
        sport: Sport,
    ) -> BoxFuture<'static, Result<RecordingToken, RecordingError>> {
        let recorder = self.clone();
        Box::pin(async move {
            let token = RecordingToken {
                match_id,
                sport,
                filename: recording_filename(sport, local_now())?,
            };
            recorder.send(RecordingAction::Start, &token)?;
            info!(match_id = %match_id, filename = %token.filename, "recording requested");
            Ok(token)
        })
    }

    fn stop_recording(
        &self,
        token: RecordingToken,
    ) -> BoxFuture<'static, Result<Option<String>, RecordingError>> {
        let recorder = self.clone();
        Box::pin(async move {
            recorder.send(RecordingAction::Stop, &token)?;
            info!(match_id = %token.match_id, filename = %token.filename, "recording stopped");
            Ok(Some(token.filename))
        })
    }
}

/// Used when recording is switched off in the configuration.
pub struct DisabledRecorder;

impl RecordingController for DisabledRecorder {
    fn start_recording(
        &self,
        match_id: Uuid,
        sport: Sport,
    ) -> BoxFuture<'static, Result<RecordingToken, RecordingError>> {
        Box::pin(async move {
            Ok(RecordingToken {
                match_id,
                sport,
                filename: String::new(),
            })
        })
    }

    fn stop_recording(
        &self,
        _token: RecordingToken,
    ) -> BoxFuture<'static, Result<Option<String>, RecordingError>> {
        Box::pin(async { Ok(None) })
    }
}
