use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex};

use snap_core::Board;
use snap_store::{
    BlobStore, FileBlobStore, FileItemStore, FileLocalStorage, InMemoryBlobStore,
    InMemoryItemStore, InMemoryLocalStorage, ItemStore, LocalStorage,
};
use snap_types::DeviceId;
use tokio::sync::MutexGuard;
use tracing::info;

use crate::auth::{HeaderIdentity, RequestIdentity};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Number of locks device votes are spread over.
const DEVICE_LOCK_STRIPES: usize = 64;

/// Shared state behind every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: ServerConfig,
    items: Arc<dyn ItemStore>,
    blobs: Arc<dyn BlobStore>,
    identity: Arc<dyn RequestIdentity>,
    /// Board for adds and removes, which never touch a like record.
    host: Board,
    /// Like records of devices, when they are not kept on disk.
    device_records: Mutex<HashMap<DeviceId, Arc<InMemoryLocalStorage>>>,
    /// A device's votes run under the stripe its id hashes to, so one
    /// device never has two votes in flight.
    device_locks: Vec<tokio::sync::Mutex<()>>,
}

impl AppState {
    /// Build stores from `config`: file-backed under `data_dir` when set,
    /// otherwise in memory.
    pub fn new(config: ServerConfig) -> Self {
        let (items, blobs): (Arc<dyn ItemStore>, Arc<dyn BlobStore>) = match &config.data_dir {
            Some(dir) => {
                info!(data_dir = %dir.display(), "using file-backed stores");
                (
                    Arc::new(FileItemStore::new(dir.join("items.json"))),
                    Arc::new(FileBlobStore::with_base_url(
                        dir.join("blobs"),
                        config.blob_base_url(),
                    )),
                )
            }
            None => (
                Arc::new(InMemoryItemStore::new()),
                Arc::new(InMemoryBlobStore::new(config.blob_base_url())),
            ),
        };
        Self::with_stores(config, items, blobs, Arc::new(HeaderIdentity))
    }

    pub fn with_stores(
        config: ServerConfig,
        items: Arc<dyn ItemStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn RequestIdentity>,
    ) -> Self {
        let host = Board::new(
            items.clone(),
            blobs.clone(),
            Arc::new(InMemoryLocalStorage::new()),
            config.board.clone(),
        );
        Self {
            inner: Arc::new(Inner {
                config,
                items,
                blobs,
                identity,
                host,
                device_records: Mutex::new(HashMap::new()),
                device_locks: (0..DEVICE_LOCK_STRIPES)
                    .map(|_| tokio::sync::Mutex::new(()))
                    .collect(),
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn items(&self) -> &dyn ItemStore {
        &*self.inner.items
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        &*self.inner.blobs
    }

    pub fn identity(&self) -> &dyn RequestIdentity {
        &*self.inner.identity
    }

    pub fn host_board(&self) -> &Board {
        &self.inner.host
    }

    /// A board over `device`'s like record, built for one request.
    ///
    /// With `device_state_dir` set the record is read from disk and nothing
    /// is kept in memory between requests. Otherwise only the record itself
    /// is retained.
    pub fn device_board(&self, device: &DeviceId) -> ServerResult<Board> {
        let local: Arc<dyn LocalStorage> = match &self.inner.config.device_state_dir {
            Some(dir) => Arc::new(FileLocalStorage::new(
                dir.join(format!("{}.json", device.as_str())),
            )),
            None => {
                let mut records = self
                    .inner
                    .device_records
                    .lock()
                    .map_err(|e| ServerError::Internal(format!("lock poisoned: {e}")))?;
                records
                    .entry(device.clone())
                    .or_insert_with(|| {
                        tracing::debug!(%device, "device like record created");
                        Arc::new(InMemoryLocalStorage::new())
                    })
                    .clone()
            }
        };
        Ok(Board::new(
            self.inner.items.clone(),
            self.inner.blobs.clone(),
            local,
            self.inner.config.board.clone(),
        ))
    }

    /// Hold while a like or dislike for `device` runs.
    pub async fn lock_device(&self, device: &DeviceId) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        device.hash(&mut hasher);
        let stripe = (hasher.finish() % DEVICE_LOCK_STRIPES as u64) as usize;
        self.inner.device_locks[stripe].lock().await
    }

    #[cfg(test)]
    fn retained_devices(&self) -> usize {
        self.inner
            .device_records
            .lock()
            .map(|records| records.len())
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
