use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::BoxFuture;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::dao::{
    history_store::{HistoryStore, apply_memo, apply_video},
    models::HistoryEntryEntity,
    storage::{StorageError, StorageResult},
};

/// Volatile history kept in process memory. Availability can be toggled to exercise degraded
/// mode in tests.
#[derive(Clone, Default)]
pub struct InMemoryHistoryStore {
    entries: Arc<Mutex<Vec<HistoryEntryEntity>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryHistoryStore {
    /// Empty store, available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail (or succeed again).
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                "in-memory history switched offline".to_string(),
                io::Error::from(io::ErrorKind::NotConnected),
            ))
        } else {
            Ok(())
        }
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn append(&self, entry: HistoryEntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            store.entries.lock().await.push(entry);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<HistoryEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            Ok(store.entries.lock().await.clone())
        })
    }

    fn update_memo(
        &self,
        id: Uuid,
        memo: String,
    ) -> BoxFuture<'static, StorageResult<HistoryEntryEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            let mut entries = store.entries.lock().await;
            apply_memo(&mut entries, id, memo)
        })
    }

    fn attach_video(
        &self,
        match_id: Uuid,
        video_ref: String,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            let mut entries = store.entries.lock().await;
            Ok(apply_video(&mut entries, match_id, &video_ref))
        })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check()?;
            store.entries.lock().await.clear();
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check() })
    }
}
