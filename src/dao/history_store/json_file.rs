use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use futures::future::BoxFuture;
use tokio::{fs, sync::Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::dao::{
    history_store::{HistoryStore, apply_memo, apply_video},
    models::HistoryEntryEntity,
    storage::{StorageError, StorageResult},
};

/// History persisted as a single JSON array on local disk.
///
/// Writes go to a sibling temporary file that is renamed over the target, so a crash never
/// leaves a half-written document behind.
#[derive(Clone)]
pub struct JsonFileHistoryStore {
    path: Arc<PathBuf>,
    /// Serialises read-modify-write cycles.
    lock: Arc<Mutex<()>>,
}

impl JsonFileHistoryStore {
    /// Prepare the store, creating the parent directory when needed.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let store = Self {
            path: Arc::new(path.into()),
            lock: Arc::new(Mutex::new(())),
        };
        store.ensure_parent().await?;
        store.read_all().await?;
        Ok(store)
    }

    async fn ensure_parent(&self) -> StorageResult<()> {
        let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        fs::create_dir_all(parent).await.map_err(|source| {
            StorageError::unavailable(
                format!("cannot create history directory `{}`", parent.display()),
                source,
            )
        })
    }

    async fn read_all(&self) -> StorageResult<Vec<HistoryEntryEntity>> {
        let contents = match fs::read(self.path.as_ref()).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::unavailable(
                    format!("cannot read `{}`", self.path.display()),
                    source,
                ));
            }
        };
        if contents.is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&contents).map_err(|source| {
            StorageError::corrupted(format!("`{}` is not a history list", self.path.display()), source)
        })
    }

    async fn write_all(&self, entries: &[HistoryEntryEntity]) -> StorageResult<()> {
        let payload = serde_json::to_vec_pretty(entries).map_err(|source| {
            StorageError::corrupted("cannot serialise history".to_string(), source)
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload).await.map_err(|source| {
            StorageError::unavailable(format!("cannot write `{}`", tmp.display()), source)
        })?;
        fs::rename(&tmp, self.path.as_ref()).await.map_err(|source| {
            StorageError::unavailable(
                format!("cannot replace `{}`", self.path.display()),
                source,
            )
        })?;

        debug!(path = %self.path.display(), count = entries.len(), "history written");
        Ok(())
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn append(&self, entry: HistoryEntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut entries = store.read_all().await?;
            entries.push(entry);
            store.write_all(&entries).await
        })
    }

    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<HistoryEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            store.read_all().await
        })
    }

    fn update_memo(
        &self,
        id: Uuid,
        memo: String,
    ) -> BoxFuture<'static, StorageResult<HistoryEntryEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut entries = store.read_all().await?;
            let updated = apply_memo(&mut entries, id, memo)?;
            store.write_all(&entries).await?;
            Ok(updated)
        })
    }

    fn attach_video(
        &self,
        match_id: Uuid,
        video_ref: String,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut entries = store.read_all().await?;
            let updated = apply_video(&mut entries, match_id, &video_ref);
            if updated > 0 {
                store.write_all(&entries).await?;
            }
            Ok(updated)
        })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            store.write_all(&[]).await
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            store.read_all().await.map(|_| ())
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_parent().await })
    }
}
