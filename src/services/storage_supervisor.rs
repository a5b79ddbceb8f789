use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{history_store::HistoryStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Open the history store and keep the shared state in degraded mode while it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut open: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn HistoryStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match open().await {
            Ok(store) => {
                state.set_history_store(store.clone()).await;
                info!("history store ready; leaving degraded mode");
                delay = INITIAL_DELAY;

                supervise(&state, store.as_ref()).await;

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "history store could not be opened");
                state.update_degraded(true);
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll the store until it fails and cannot be recovered in place.
async fn supervise(state: &SharedState, store: &dyn HistoryStore) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded() {
                info!("history healthy again; leaving degraded mode");
                state.update_degraded(false);
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        let mut reconnect_delay = INITIAL_DELAY;
        let mut reconnected = false;
        for attempt in 0..MAX_RECONNECT_ATTEMPTS {
            match store.try_reconnect().await {
                Ok(()) if store.health_check().await.is_ok() => {
                    info!(attempt, "history store recovered after health check failure");
                    reconnected = true;
                    break;
                }
                Ok(()) => warn!(attempt, "history store reachable but still unhealthy"),
                Err(err) => warn!(attempt, error = %err, "history reconnect attempt failed"),
            }
            if attempt == 0 {
                warn!("entering degraded mode");
                state.update_degraded(true);
            }
            sleep(reconnect_delay).await;
            reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
        }

        if !reconnected {
            warn!("exhausted history reconnect attempts; staying in degraded mode");
            state.update_degraded(true);
            return;
        }

        state.update_degraded(false);
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::history_store::InMemoryHistoryStore, state::AppState};

    #[tokio::test(start_paused = true)]
    async fn outage_toggles_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        let store = Arc::new(InMemoryHistoryStore::new());
        assert!(state.is_degraded());

        let handle = {
            let store = store.clone();
            tokio::spawn(run(state.clone(), move || {
                let store = store.clone();
                async move { Ok(store as Arc<dyn HistoryStore>) }
            }))
        };

        sleep(Duration::from_millis(10)).await;
        assert!(!state.is_degraded());

        store.set_available(false);
        sleep(HEALTH_POLL_INTERVAL + Duration::from_millis(10)).await;
        assert!(state.is_degraded());

        store.set_available(true);
        sleep(MAX_DELAY * 4).await;
        assert!(!state.is_degraded());

        handle.abort();
    }
}
