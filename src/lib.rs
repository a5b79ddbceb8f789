//! Library crate for rally-score-back, exposing modules for binaries and tests.

/// Runtime configuration loaded from disk.
pub mod config;
/// History persistence.
pub mod dao;
/// Request, response and event payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP, SSE and WebSocket routes.
pub mod routes;
/// Application services between the routes and the scoreboard.
pub mod services;
/// Scoring core and shared application state.
pub mod state;
