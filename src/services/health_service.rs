use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether match history is available, pinging the store on the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.history_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "history health check failed");
            }
        }
        None => warn!("history unavailable (degraded mode)"),
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
