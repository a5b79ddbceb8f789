use time::OffsetDateTime;

/// OpenAPI documentation generation.
pub mod documentation;
/// Dispatch of controller outputs to the collaborators.
pub mod effects;
/// Health check service.
pub mod health_service;
/// Match history queries and edits.
pub mod history_service;
/// Scoring commands against the shared scoreboard.
pub mod match_service;
/// Spoken announcements.
pub mod narration;
/// Match video capture.
pub mod recording;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// History store supervision with reconnect backoff.
pub mod storage_supervisor;
/// Clicker WebSocket connection and message handling service.
pub mod websocket_service;

/// Current wall-clock time in the device's offset, UTC when the offset cannot be determined.
pub(crate) fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
