/// Scoreboard snapshots shared by REST and SSE.
pub mod common;
/// Health check payloads.
pub mod health;
/// Match history payloads.
pub mod history;
/// Scoring command payloads.
pub mod matches;
/// Display stream payloads.
pub mod sse;
/// Shared validation helpers.
pub mod validation;
/// Clicker WebSocket messages.
pub mod ws;
