/// Match controller, the only mutator of the scoreboard.
pub mod controller;
/// Undo log of scored points.
pub mod event_log;
/// Match configuration value types.
pub mod game;
/// Sets won across the match.
pub mod match_tracker;
/// Side-effect requests returned by the controller.
pub mod output;
/// Serve rotation rules.
pub mod serve;
/// Score of the current set.
pub mod set_tracker;
mod sse;
/// Match phases and their transitions.
pub mod state_machine;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::history_store::HistoryStore,
    error::ServiceError,
    services::{
        history_service::{self, HistoryJob},
        narration::{NarrationSink, SseNarrator},
        recording::{ClientRecorder, DisabledRecorder, RecordingController, RecordingToken},
    },
};

pub use self::sse::SseHub;
use self::controller::MatchController;

/// Application state shared across handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Capacity of the display broadcast channel.
const DISPLAY_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
/// Handle used to push messages to a connected clicker.
pub struct ClickerConnection {
    /// Identifier the clicker announced itself with.
    pub id: String,
    /// Outbound queue drained by the socket's writer task.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state: the scoreboard, its collaborators and the open connections.
pub struct AppState {
    config: AppConfig,
    history_store: RwLock<Option<Arc<dyn HistoryStore>>>,
    display: SseHub,
    clickers: DashMap<String, ClickerConnection>,
    scoreboard: Mutex<MatchController>,
    recording: Mutex<Option<RecordingToken>>,
    /// Keeps side effects in commit order across concurrent commands.
    emit_gate: Mutex<()>,
    narrator: Arc<dyn NarrationSink>,
    recorder: Arc<dyn RecordingController>,
    degraded: watch::Sender<bool>,
    history_jobs: mpsc::UnboundedSender<HistoryJob>,
}

impl AppState {
    /// Build the state with the default display-backed narrator and recorder.
    ///
    /// The application starts in degraded mode until a history store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let display = SseHub::new(DISPLAY_CHANNEL_CAPACITY);
        let narrator: Arc<dyn NarrationSink> = Arc::new(SseNarrator::new(
            display.clone(),
            config.narration.clone(),
        ));
        let recorder: Arc<dyn RecordingController> = if config.recording.enabled {
            Arc::new(ClientRecorder::new(display.clone()))
        } else {
            Arc::new(DisabledRecorder)
        };
        Self::with_collaborators(config, display, narrator, recorder)
    }

    /// Build the state around explicit collaborators.
    ///
    /// Spawns the history writer, so it must be called from within a Tokio runtime.
    pub fn with_collaborators(
        config: AppConfig,
        display: SseHub,
        narrator: Arc<dyn NarrationSink>,
        recorder: Arc<dyn RecordingController>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let controller = MatchController::new(config.scoring.reset_serve_each_set);
        let (history_tx, history_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Self {
            config,
            history_store: RwLock::new(None),
            display,
            clickers: DashMap::new(),
            scoreboard: Mutex::new(controller),
            recording: Mutex::new(None),
            emit_gate: Mutex::new(()),
            narrator,
            recorder,
            degraded: degraded_tx,
            history_jobs: history_tx,
        });
        tokio::spawn(history_service::run_writer(
            Arc::downgrade(&state),
            history_rx,
        ));
        state
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current history store, if one is installed.
    pub async fn history_store(&self) -> Option<Arc<dyn HistoryStore>> {
        let guard = self.history_store.read().await;
        guard.as_ref().cloned()
    }

    /// Like [`Self::history_store`] but failing in degraded mode.
    pub async fn require_history_store(&self) -> Result<Arc<dyn HistoryStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.history_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new history store implementation and leave degraded mode.
    pub async fn set_history_store(&self, store: Arc<dyn HistoryStore>) {
        {
            let mut guard = self.history_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Broadcast hub used for the display stream.
    pub fn display(&self) -> &SseHub {
        &self.display
    }

    /// Registry of active clicker sockets keyed by their identifier.
    pub fn clickers(&self) -> &DashMap<String, ClickerConnection> {
        &self.clickers
    }

    /// The single scoreboard. Hold the lock only for the duration of one command.
    pub fn scoreboard(&self) -> &Mutex<MatchController> {
        &self.scoreboard
    }

    /// Recording of the current match, if one was started.
    pub fn recording(&self) -> &Mutex<Option<RecordingToken>> {
        &self.recording
    }

    /// Taken before the scoreboard lock is released and held while the outputs are dispatched.
    pub fn emit_gate(&self) -> &Mutex<()> {
        &self.emit_gate
    }

    /// Hand a write to the background history writer without waiting for it.
    pub fn queue_history(&self, job: HistoryJob) {
        if let Err(err) = self.history_jobs.send(job) {
            warn!(job = ?err.0, "history writer is gone; dropping write");
        }
    }

    /// Sink receiving every announcement.
    pub fn narrator(&self) -> &dyn NarrationSink {
        self.narrator.as_ref()
    }

    /// Controller starting and stopping match videos.
    pub fn recorder(&self) -> Arc<dyn RecordingController> {
        self.recorder.clone()
    }
}
