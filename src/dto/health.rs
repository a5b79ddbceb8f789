use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
}

impl HealthResponse {
    /// The scoreboard and its history are available.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Scoring works but match history cannot be written.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}
